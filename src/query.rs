use crate::database;
use crate::database::models::{Ingredient, IngredientId, Recipe, RecipeId, Tag, TagId, User, UserId};
use crate::error::{Error, Result};
use crate::projection::Viewer;
use diesel::ExpressionMethods as _;
use diesel::JoinOnDsl as _;
use diesel::OptionalExtension as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use serde::Serialize;

pub fn add_ingredient(
    conn: &mut database::Connection,
    new_name: &str,
    new_measurement_unit: &str,
) -> Result<Ingredient> {
    use database::schema::ingredients::dsl::*;
    use diesel::insert_into;

    Ok(insert_into(ingredients)
        .values((name.eq(new_name), measurement_unit.eq(new_measurement_unit)))
        .get_result(conn)?)
}

pub fn add_tag(
    conn: &mut database::Connection,
    new_name: &str,
    new_color: &str,
    new_slug: &str,
) -> Result<Tag> {
    use database::schema::tags::dsl::*;
    use diesel::insert_into;

    Ok(insert_into(tags)
        .values((name.eq(new_name), color.eq(new_color), slug.eq(new_slug)))
        .get_result(conn)?)
}

pub fn find_ingredient(
    conn: &mut database::Connection,
    ingredient_id: IngredientId,
) -> Result<Ingredient> {
    use database::schema::ingredients::dsl::*;

    ingredients
        .select(Ingredient::as_select())
        .filter(id.eq(ingredient_id))
        .get_result(conn)
        .optional()?
        .ok_or_else(|| Error::not_found(format!("ingredient {ingredient_id} does not exist")))
}

pub fn find_tag(conn: &mut database::Connection, tag_id: TagId) -> Result<Tag> {
    use database::schema::tags::dsl::*;

    tags.select(Tag::as_select())
        .filter(id.eq(tag_id))
        .get_result(conn)
        .optional()?
        .ok_or_else(|| Error::not_found(format!("tag {tag_id} does not exist")))
}

pub fn find_recipe(conn: &mut database::Connection, recipe_id: RecipeId) -> Result<Recipe> {
    use database::schema::recipes::dsl::*;

    recipes
        .select(Recipe::as_select())
        .filter(id.eq(recipe_id))
        .get_result(conn)
        .optional()?
        .ok_or_else(|| Error::not_found(format!("recipe {recipe_id} does not exist")))
}

pub fn find_user(conn: &mut database::Connection, user_id: UserId) -> Result<User> {
    use database::schema::users::dsl::*;

    users
        .select(User::as_select())
        .filter(id.eq(user_id))
        .get_result(conn)
        .optional()?
        .ok_or_else(|| Error::not_found(format!("user {user_id} does not exist")))
}

pub fn find_user_by_username(conn: &mut database::Connection, name: &str) -> Result<User> {
    use database::schema::users::dsl::*;

    users
        .select(User::as_select())
        .filter(username.eq(name))
        .get_result(conn)
        .optional()?
        .ok_or_else(|| Error::not_found(format!("user {name:?} does not exist")))
}

pub fn list_tags(conn: &mut database::Connection) -> Result<Vec<Tag>> {
    use database::schema::tags::dsl::*;

    Ok(tags.select(Tag::as_select()).order(id.asc()).load(conn)?)
}

/// Prefix search over ingredient names. Sqlite's LIKE is case-insensitive
/// for ascii, which covers the reference data set.
pub fn search_ingredients(conn: &mut database::Connection, query: &str) -> Result<Vec<Ingredient>> {
    use database::schema::ingredients::dsl::*;
    use diesel::expression_methods::TextExpressionMethods as _;

    Ok(ingredients
        .select(Ingredient::as_select())
        .filter(name.like(format!("{query}%")))
        .order((name.asc(), measurement_unit.asc()))
        .load(conn)?)
}

pub fn exists_ingredient(
    conn: &mut database::Connection,
    ingredient_id: IngredientId,
) -> Result<bool> {
    use database::schema::ingredients::dsl::*;
    use diesel::dsl::exists;

    Ok(diesel::select(exists(ingredients.filter(id.eq(ingredient_id)))).get_result(conn)?)
}

pub fn exists_tag(conn: &mut database::Connection, tag_id: TagId) -> Result<bool> {
    use database::schema::tags::dsl::*;
    use diesel::dsl::exists;

    Ok(diesel::select(exists(tags.filter(id.eq(tag_id)))).get_result(conn)?)
}

pub fn exists_favorite(
    conn: &mut database::Connection,
    user: UserId,
    recipe: RecipeId,
) -> Result<bool> {
    use database::schema::favorites::dsl::*;
    use diesel::dsl::exists;

    Ok(diesel::select(exists(
        favorites.filter(user_id.eq(user)).filter(recipe_id.eq(recipe)),
    ))
    .get_result(conn)?)
}

pub fn exists_cart_entry(
    conn: &mut database::Connection,
    user: UserId,
    recipe: RecipeId,
) -> Result<bool> {
    use database::schema::shopping_cart_entries::dsl::*;
    use diesel::dsl::exists;

    Ok(diesel::select(exists(
        shopping_cart_entries
            .filter(user_id.eq(user))
            .filter(recipe_id.eq(recipe)),
    ))
    .get_result(conn)?)
}

pub fn exists_follow(
    conn: &mut database::Connection,
    user: UserId,
    author: UserId,
) -> Result<bool> {
    use database::schema::follows::dsl::*;
    use diesel::dsl::exists;

    Ok(diesel::select(exists(
        follows.filter(user_id.eq(user)).filter(author_id.eq(author)),
    ))
    .get_result(conn)?)
}

/// One aggregated shopping-list group: every ingredient amount in the
/// viewer's cart with this (name, unit) pair, summed across recipes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CartLine {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

pub fn sum_cart_ingredients(
    conn: &mut database::Connection,
    user: UserId,
) -> Result<Vec<CartLine>> {
    use database::schema::{ingredient_amounts, ingredients, shopping_cart_entries};
    use diesel::dsl::sum;

    let rows: Vec<(String, String, Option<i64>)> = ingredient_amounts::table
        .inner_join(ingredients::table)
        .inner_join(
            shopping_cart_entries::table
                .on(shopping_cart_entries::recipe_id.eq(ingredient_amounts::recipe_id)),
        )
        .filter(shopping_cart_entries::user_id.eq(user))
        .group_by((ingredients::name, ingredients::measurement_unit))
        .select((
            ingredients::name,
            ingredients::measurement_unit,
            sum(ingredient_amounts::amount),
        ))
        .order_by((ingredients::name.asc(), ingredients::measurement_unit.asc()))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(name, measurement_unit, total)| CartLine {
            name,
            measurement_unit,
            total: total.unwrap_or(0),
        })
        .collect())
}

/// Filter kinds the gateway composes into a recipe listing request.
#[derive(Debug, Clone)]
pub enum RecipeFilter {
    Author(UserId),
    TagSlugAnyOf(Vec<String>),
    FavoritedBy(Viewer),
    InCartOf(Viewer),
}

/// Interprets a set of filters, newest recipes first. Viewer-scoped
/// filters with an anonymous viewer yield an empty listing, not an error.
pub fn filter_recipes(
    conn: &mut database::Connection,
    filters: &[RecipeFilter],
) -> Result<Vec<Recipe>> {
    use database::schema::{favorites, recipe_tags, recipes, shopping_cart_entries, tags};

    let mut query = recipes::table
        .select(Recipe::as_select())
        .order((recipes::pub_date.desc(), recipes::id.desc()))
        .into_boxed();

    for filter in filters {
        match filter {
            RecipeFilter::Author(author) => {
                query = query.filter(recipes::author_id.eq(*author));
            }
            RecipeFilter::TagSlugAnyOf(slugs) => {
                let tagged = recipe_tags::table
                    .inner_join(tags::table)
                    .filter(tags::slug.eq_any(slugs))
                    .select(recipe_tags::recipe_id);
                query = query.filter(recipes::id.eq_any(tagged));
            }
            RecipeFilter::FavoritedBy(viewer) => {
                let Some(user) = viewer.user_id() else {
                    return Ok(vec![]);
                };
                let favorited = favorites::table
                    .filter(favorites::user_id.eq(user))
                    .select(favorites::recipe_id);
                query = query.filter(recipes::id.eq_any(favorited));
            }
            RecipeFilter::InCartOf(viewer) => {
                let Some(user) = viewer.user_id() else {
                    return Ok(vec![]);
                };
                let in_cart = shopping_cart_entries::table
                    .filter(shopping_cart_entries::user_id.eq(user))
                    .select(shopping_cart_entries::recipe_id);
                query = query.filter(recipes::id.eq_any(in_cart));
            }
        }
    }

    Ok(query.load(conn)?)
}
