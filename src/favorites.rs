use crate::database;
use crate::database::models::{Favorite, RecipeBrief, RecipeId, ShoppingCartEntry, UserId};
use crate::error::{Error, Result};
use crate::query;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;

fn recipe_brief(conn: &mut database::Connection, recipe: RecipeId) -> Result<RecipeBrief> {
    use database::schema::recipes::dsl::*;

    Ok(recipes
        .select(RecipeBrief::as_select())
        .filter(id.eq(recipe))
        .get_result(conn)?)
}

pub fn add_favorite(
    conn: &mut database::Connection,
    user: UserId,
    recipe: RecipeId,
) -> Result<RecipeBrief> {
    use database::schema::favorites::dsl::*;
    use diesel::insert_into;

    query::find_recipe(conn, recipe)?;
    if query::exists_favorite(conn, user, recipe)? {
        return Err(Error::conflict("recipe is already in favorites"));
    }
    insert_into(favorites)
        .values(Favorite {
            user_id: user,
            recipe_id: recipe,
        })
        .execute(conn)?;
    recipe_brief(conn, recipe)
}

pub fn remove_favorite(
    conn: &mut database::Connection,
    user: UserId,
    recipe: RecipeId,
) -> Result<()> {
    use database::schema::favorites::dsl::*;
    use diesel::delete;

    let removed = delete(favorites.filter(user_id.eq(user)).filter(recipe_id.eq(recipe)))
        .execute(conn)?;
    if removed == 0 {
        return Err(Error::not_found("recipe is not in favorites"));
    }
    Ok(())
}

pub fn add_to_cart(
    conn: &mut database::Connection,
    user: UserId,
    recipe: RecipeId,
) -> Result<RecipeBrief> {
    use database::schema::shopping_cart_entries::dsl::*;
    use diesel::insert_into;

    query::find_recipe(conn, recipe)?;
    if query::exists_cart_entry(conn, user, recipe)? {
        return Err(Error::conflict("recipe is already in cart"));
    }
    insert_into(shopping_cart_entries)
        .values(ShoppingCartEntry {
            user_id: user,
            recipe_id: recipe,
        })
        .execute(conn)?;
    recipe_brief(conn, recipe)
}

pub fn remove_from_cart(
    conn: &mut database::Connection,
    user: UserId,
    recipe: RecipeId,
) -> Result<()> {
    use database::schema::shopping_cart_entries::dsl::*;
    use diesel::delete;

    let removed = delete(
        shopping_cart_entries
            .filter(user_id.eq(user))
            .filter(recipe_id.eq(recipe)),
    )
    .execute(conn)?;
    if removed == 0 {
        return Err(Error::not_found("recipe is not in cart"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authoring::{create_recipe, IngredientLine, RecipeDraft};
    use crate::database::test_util;

    fn some_recipe(conn: &mut database::Connection, author: UserId) -> RecipeId {
        let lunch = test_util::tag(conn, "lunch");
        let tomato = test_util::ingredient(conn, "tomato", "g");
        create_recipe(
            conn,
            author,
            &RecipeDraft {
                name: "Salad".into(),
                text: "chop and mix".into(),
                cooking_time: 5,
                image: "media/salad.png".into(),
                tags: vec![lunch],
                ingredients: vec![IngredientLine { ingredient: tomato, amount: 200 }],
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn favorite_add_conflicts_remove_is_single_shot() {
        let mut conn = test_util::test_connection();
        let alice = test_util::user_id(&mut conn, "alice");
        let bob = test_util::user_id(&mut conn, "bob");
        let recipe = some_recipe(&mut conn, alice);

        let brief = add_favorite(&mut conn, bob, recipe).unwrap();
        assert_eq!(brief.id, recipe);
        match add_favorite(&mut conn, bob, recipe) {
            Err(Error::Conflict(message)) => assert_eq!(message, "recipe is already in favorites"),
            other => panic!("expected conflict, got {other:?}"),
        }

        remove_favorite(&mut conn, bob, recipe).unwrap();
        match remove_favorite(&mut conn, bob, recipe) {
            Err(Error::NotFound(message)) => assert_eq!(message, "recipe is not in favorites"),
            other => panic!("expected not-found, got {other:?}"),
        }
    }

    #[test]
    fn cart_add_conflicts_remove_is_single_shot() {
        let mut conn = test_util::test_connection();
        let alice = test_util::user_id(&mut conn, "alice");
        let recipe = some_recipe(&mut conn, alice);

        add_to_cart(&mut conn, alice, recipe).unwrap();
        match add_to_cart(&mut conn, alice, recipe) {
            Err(Error::Conflict(message)) => assert_eq!(message, "recipe is already in cart"),
            other => panic!("expected conflict, got {other:?}"),
        }

        remove_from_cart(&mut conn, alice, recipe).unwrap();
        match remove_from_cart(&mut conn, alice, recipe) {
            Err(Error::NotFound(message)) => assert_eq!(message, "recipe is not in cart"),
            other => panic!("expected not-found, got {other:?}"),
        }
    }

    #[test]
    fn adding_a_missing_recipe_is_not_found() {
        let mut conn = test_util::test_connection();
        let alice = test_util::user_id(&mut conn, "alice");
        let recipe = some_recipe(&mut conn, alice);
        let alice_user = crate::query::find_user(&mut conn, alice).unwrap();
        crate::authoring::delete_recipe(&mut conn, &alice_user, recipe).unwrap();

        match add_favorite(&mut conn, alice, recipe) {
            Err(Error::NotFound(_)) => {}
            other => panic!("expected not-found, got {other:?}"),
        }
    }
}
