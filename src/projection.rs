use crate::database;
use crate::database::models::{Ingredient, IngredientId, Recipe, RecipeId, Tag, User, UserId};
use crate::error::Result;
use crate::query;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use serde::Serialize;

/// The identity the auth collaborator resolved for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    Anonymous,
    User(UserId),
}

impl Viewer {
    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Anonymous => None,
            Self::User(id) => Some(*id),
        }
    }

    /// For viewer-scoped actions the gateway gates on a signed-in user.
    pub fn require_user(&self) -> Result<UserId> {
        self.user_id().ok_or(crate::error::Error::AuthenticationRequired)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RecipeIngredient {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

/// A recipe as returned to clients: associations resolved and the two
/// viewer-relative flags computed. Anonymous viewers get `false` flags.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    pub id: RecipeId,
    pub tags: Vec<Tag>,
    pub author: UserProfile,
    pub ingredients: Vec<RecipeIngredient>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

pub fn user_profile(
    conn: &mut database::Connection,
    user: &User,
    viewer: &Viewer,
) -> Result<UserProfile> {
    let is_subscribed = match viewer.user_id() {
        Some(viewer_id) => query::exists_follow(conn, viewer_id, user.id)?,
        None => false,
    };
    Ok(UserProfile {
        id: user.id,
        email: user.email.clone(),
        username: user.username.clone(),
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        is_subscribed,
    })
}

fn recipe_ingredients(
    conn: &mut database::Connection,
    recipe: RecipeId,
) -> Result<Vec<RecipeIngredient>> {
    use database::schema::{ingredient_amounts, ingredients};

    let rows: Vec<(Ingredient, i32)> = ingredient_amounts::table
        .inner_join(ingredients::table)
        .filter(ingredient_amounts::recipe_id.eq(recipe))
        .order(ingredient_amounts::id.asc())
        .select((Ingredient::as_select(), ingredient_amounts::amount))
        .load(conn)?;

    Ok(rows
        .into_iter()
        .map(|(ingredient, amount)| RecipeIngredient {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
            amount,
        })
        .collect())
}

fn recipe_tags(conn: &mut database::Connection, recipe: RecipeId) -> Result<Vec<Tag>> {
    use database::schema::{recipe_tags, tags};

    Ok(recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq(recipe))
        .order(tags::id.asc())
        .select(Tag::as_select())
        .load(conn)?)
}

pub fn recipe_detail(
    conn: &mut database::Connection,
    recipe: &Recipe,
    viewer: &Viewer,
) -> Result<RecipeDetail> {
    let author = query::find_user(conn, recipe.author_id)?;
    let author = user_profile(conn, &author, viewer)?;
    let tags = recipe_tags(conn, recipe.id)?;
    let ingredients = recipe_ingredients(conn, recipe.id)?;

    let (is_favorited, is_in_shopping_cart) = match viewer.user_id() {
        Some(viewer_id) => (
            query::exists_favorite(conn, viewer_id, recipe.id)?,
            query::exists_cart_entry(conn, viewer_id, recipe.id)?,
        ),
        None => (false, false),
    };

    Ok(RecipeDetail {
        id: recipe.id,
        tags,
        author,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name.clone(),
        image: recipe.image.clone(),
        text: recipe.text.clone(),
        cooking_time: recipe.cooking_time,
    })
}
