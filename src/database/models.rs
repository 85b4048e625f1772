// Copyright 2026 Remi Bernotavicius

use chrono::NaiveDateTime;
use derive_more::Display;
use diesel::associations::{Associations, Identifiable};
use diesel::deserialize::Queryable;
use diesel::expression::Selectable;
use diesel::prelude::Insertable;
use diesel_derive_newtype::DieselNewType;
use serde::{Deserialize, Serialize};

#[derive(DieselNewType, Display, Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub struct UserId(i32);

#[derive(DieselNewType, Display, Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub struct IngredientId(i32);

#[derive(DieselNewType, Display, Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub struct TagId(i32);

#[derive(DieselNewType, Display, Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub struct RecipeId(i32);

#[derive(Queryable, Selectable, Identifiable, Clone, Debug)]
#[diesel(table_name = crate::database::schema::users)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
    pub is_active: bool,
    pub is_admin: bool,
}

/// The password field carries the hash supplied by the auth collaborator,
/// never a plain-text password.
#[derive(Insertable, Debug)]
#[diesel(table_name = crate::database::schema::users)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Queryable, Selectable, Identifiable, Clone, Debug, Serialize)]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Insertable, Deserialize, Debug)]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct NewIngredient {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Queryable, Selectable, Identifiable, Clone, Debug, PartialEq, Eq, Serialize)]
#[diesel(table_name = crate::database::schema::tags)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Associations, Queryable, Selectable, Identifiable, Clone, Debug)]
#[diesel(belongs_to(User, foreign_key = author_id))]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub author_id: UserId,
    pub text: String,
    pub cooking_time: i32,
    pub image: String,
    pub pub_date: NaiveDateTime,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct NewRecipe<'a> {
    pub name: &'a str,
    pub author_id: UserId,
    pub text: &'a str,
    pub cooking_time: i32,
    pub image: &'a str,
    pub pub_date: NaiveDateTime,
}

/// Subset of a recipe row used by listings and toggle confirmations.
#[derive(Queryable, Selectable, Clone, Debug, Serialize)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct RecipeBrief {
    pub id: RecipeId,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

#[derive(Associations, Queryable, Selectable, Identifiable, Clone, Debug)]
#[diesel(belongs_to(Recipe))]
#[diesel(belongs_to(Ingredient))]
#[diesel(table_name = crate::database::schema::ingredient_amounts)]
pub struct IngredientAmount {
    pub id: i32,
    pub recipe_id: RecipeId,
    pub ingredient_id: IngredientId,
    pub amount: i32,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::database::schema::ingredient_amounts)]
pub struct NewIngredientAmount {
    pub recipe_id: RecipeId,
    pub ingredient_id: IngredientId,
    pub amount: i32,
}

#[derive(Queryable, Insertable, Clone, Debug)]
#[diesel(table_name = crate::database::schema::recipe_tags)]
pub struct RecipeTag {
    pub recipe_id: RecipeId,
    pub tag_id: TagId,
}

// Favorite and ShoppingCartEntry deliberately share the same (user, recipe)
// value shape without any common base entity.

#[derive(Queryable, Insertable, Clone, Debug)]
#[diesel(table_name = crate::database::schema::favorites)]
pub struct Favorite {
    pub user_id: UserId,
    pub recipe_id: RecipeId,
}

#[derive(Queryable, Insertable, Clone, Debug)]
#[diesel(table_name = crate::database::schema::shopping_cart_entries)]
pub struct ShoppingCartEntry {
    pub user_id: UserId,
    pub recipe_id: RecipeId,
}

#[derive(Queryable, Insertable, Clone, Debug)]
#[diesel(table_name = crate::database::schema::follows)]
pub struct Follow {
    pub user_id: UserId,
    pub author_id: UserId,
}
