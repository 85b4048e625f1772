// Copyright 2026 Remi Bernotavicius

use crate::database;
use crate::database::models::{
    IngredientId, NewIngredientAmount, NewRecipe, Recipe, RecipeId, RecipeTag, TagId, User, UserId,
};
use crate::error::{Error, Result};
use crate::projection::{recipe_detail, RecipeDetail, Viewer};
use crate::query;
use diesel::Connection as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use std::collections::HashSet;

pub const MIN_AMOUNT: i32 = 1;
pub const MAX_AMOUNT: i32 = 5000;

#[derive(Debug, Clone, Copy)]
pub struct IngredientLine {
    pub ingredient: IngredientId,
    pub amount: i32,
}

#[derive(Debug, Clone)]
pub struct RecipeDraft {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: String,
    pub tags: Vec<TagId>,
    pub ingredients: Vec<IngredientLine>,
}

/// Checks a draft against the authoring rules, stopping at the first
/// violation so the caller gets one message naming the offending value.
fn validate_draft(conn: &mut database::Connection, draft: &RecipeDraft) -> Result<()> {
    let mut seen_ingredients = HashSet::new();
    for line in &draft.ingredients {
        if !query::exists_ingredient(conn, line.ingredient)? {
            return Err(Error::validation(format!(
                "ingredient {} does not exist",
                line.ingredient
            )));
        }
        if line.amount < MIN_AMOUNT || line.amount > MAX_AMOUNT {
            return Err(Error::validation(format!(
                "ingredient {} amount must be between {MIN_AMOUNT} and {MAX_AMOUNT}",
                line.ingredient
            )));
        }
        if !seen_ingredients.insert(line.ingredient) {
            return Err(Error::validation(format!(
                "ingredient {} is listed more than once",
                line.ingredient
            )));
        }
    }

    if draft.tags.is_empty() {
        return Err(Error::validation("recipe has no tags"));
    }
    let mut seen_tags = HashSet::new();
    for tag in &draft.tags {
        if !seen_tags.insert(*tag) {
            return Err(Error::validation(format!("tag {tag} is listed more than once")));
        }
    }
    for tag in &draft.tags {
        if !query::exists_tag(conn, *tag)? {
            return Err(Error::validation(format!("tag {tag} does not exist")));
        }
    }

    if draft.cooking_time < 1 {
        return Err(Error::validation("cooking time must be at least 1 minute"));
    }
    Ok(())
}

fn insert_amounts(
    conn: &mut database::Connection,
    recipe: RecipeId,
    lines: &[IngredientLine],
) -> Result<()> {
    use database::schema::ingredient_amounts::dsl::*;
    use diesel::insert_into;

    if lines.is_empty() {
        return Ok(());
    }
    let rows: Vec<_> = lines
        .iter()
        .map(|line| NewIngredientAmount {
            recipe_id: recipe,
            ingredient_id: line.ingredient,
            amount: line.amount,
        })
        .collect();
    insert_into(ingredient_amounts).values(rows).execute(conn)?;
    Ok(())
}

fn replace_tag_associations(
    conn: &mut database::Connection,
    recipe: RecipeId,
    new_tags: &[TagId],
) -> Result<()> {
    use database::schema::recipe_tags::dsl::*;
    use diesel::{delete, insert_into};

    delete(recipe_tags.filter(recipe_id.eq(recipe))).execute(conn)?;
    let rows: Vec<_> = new_tags
        .iter()
        .map(|tag| RecipeTag {
            recipe_id: recipe,
            tag_id: *tag,
        })
        .collect();
    insert_into(recipe_tags).values(rows).execute(conn)?;
    Ok(())
}

/// Validates the draft, then writes the recipe row, its ingredient amounts
/// and its tag associations in one transaction. Any failure rolls the whole
/// write back, so readers never see a recipe without its ingredients.
pub fn create_recipe(
    conn: &mut database::Connection,
    author: UserId,
    draft: &RecipeDraft,
) -> Result<RecipeDetail> {
    validate_draft(conn, draft)?;

    let recipe = conn.transaction::<Recipe, Error, _>(|conn| {
        use database::schema::recipes::dsl::*;
        use diesel::insert_into;

        let recipe: Recipe = insert_into(recipes)
            .values(NewRecipe {
                name: &draft.name,
                author_id: author,
                text: &draft.text,
                cooking_time: draft.cooking_time,
                image: &draft.image,
                pub_date: chrono::Utc::now().naive_utc(),
            })
            .get_result(conn)?;
        insert_amounts(conn, recipe.id, &draft.ingredients)?;
        replace_tag_associations(conn, recipe.id, &draft.tags)?;
        Ok(recipe)
    })?;

    log::info!("user {author} created recipe {} ({:?})", recipe.id, recipe.name);
    recipe_detail(conn, &recipe, &Viewer::User(author))
}

/// Same rule set as creation. The ingredient amounts and tag associations
/// are fully replaced, not diffed, atomically with the field updates.
///
/// Ownership is a precondition: the gateway's permission layer has already
/// established that the caller is the author (see [`ensure_can_modify`]).
pub fn update_recipe(
    conn: &mut database::Connection,
    recipe_id: RecipeId,
    draft: &RecipeDraft,
) -> Result<RecipeDetail> {
    let recipe = query::find_recipe(conn, recipe_id)?;
    validate_draft(conn, draft)?;

    let recipe = conn.transaction::<Recipe, Error, _>(|conn| {
        use database::schema::ingredient_amounts;
        use database::schema::recipes::dsl::*;
        use diesel::{delete, update};

        let recipe: Recipe = update(recipes.filter(id.eq(recipe.id)))
            .set((
                name.eq(&draft.name),
                text.eq(&draft.text),
                cooking_time.eq(draft.cooking_time),
                image.eq(&draft.image),
            ))
            .get_result(conn)?;

        delete(
            ingredient_amounts::table.filter(ingredient_amounts::recipe_id.eq(recipe.id)),
        )
        .execute(conn)?;
        insert_amounts(conn, recipe.id, &draft.ingredients)?;
        replace_tag_associations(conn, recipe.id, &draft.tags)?;
        Ok(recipe)
    })?;

    recipe_detail(conn, &recipe, &Viewer::User(recipe.author_id))
}

/// The permission predicate the gateway applies before mutations: only the
/// author or an administrator may touch a recipe.
pub fn ensure_can_modify(actor: &User, recipe: &Recipe) -> Result<()> {
    if actor.is_admin || recipe.author_id == actor.id {
        Ok(())
    } else {
        Err(Error::authorization(
            "only the recipe author may modify this recipe",
        ))
    }
}

/// Deletes a recipe; the schema cascades to its ingredient amounts, tag
/// associations, favorites and cart entries.
pub fn delete_recipe(
    conn: &mut database::Connection,
    actor: &User,
    recipe_id: RecipeId,
) -> Result<()> {
    use database::schema::recipes::dsl::*;
    use diesel::delete;

    let recipe = query::find_recipe(conn, recipe_id)?;
    ensure_can_modify(actor, &recipe)?;
    delete(recipes.filter(id.eq(recipe.id))).execute(conn)?;
    log::info!("user {} deleted recipe {}", actor.id, recipe.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_util;
    use maplit::hashset;
    use std::collections::HashSet;

    fn valid_draft(conn: &mut database::Connection) -> RecipeDraft {
        let lunch = test_util::tag(conn, "lunch");
        let tomato = test_util::ingredient(conn, "tomato", "g");
        RecipeDraft {
            name: "Salad".into(),
            text: "chop and mix".into(),
            cooking_time: 5,
            image: "media/salad.png".into(),
            tags: vec![lunch],
            ingredients: vec![IngredientLine { ingredient: tomato, amount: 200 }],
        }
    }

    fn validation_message(result: Result<RecipeDetail>) -> String {
        match result {
            Err(Error::Validation(message)) => message,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn create_returns_hydrated_projection() {
        let mut conn = test_util::test_connection();
        let alice = test_util::user_id(&mut conn, "alice");
        let lunch = test_util::tag_model(&mut conn, "lunch");
        let dinner = test_util::tag_model(&mut conn, "dinner");
        let tomato = test_util::ingredient_model(&mut conn, "tomato", "g");
        let oil = test_util::ingredient_model(&mut conn, "olive oil", "ml");

        let detail = create_recipe(
            &mut conn,
            alice,
            &RecipeDraft {
                name: "Salad".into(),
                text: "chop and mix".into(),
                cooking_time: 5,
                image: "media/salad.png".into(),
                tags: vec![lunch.id, dinner.id],
                ingredients: vec![
                    IngredientLine { ingredient: tomato.id, amount: 200 },
                    IngredientLine { ingredient: oil.id, amount: 30 },
                ],
            },
        )
        .unwrap();

        let tag_names: HashSet<_> = detail.tags.iter().map(|t| t.name.clone()).collect();
        assert_eq!(tag_names, hashset! {"lunch".to_owned(), "dinner".to_owned()});

        let lines: HashSet<_> = detail
            .ingredients
            .iter()
            .map(|i| (i.name.clone(), i.measurement_unit.clone(), i.amount))
            .collect();
        assert_eq!(
            lines,
            hashset! {
                ("tomato".to_owned(), "g".to_owned(), 200),
                ("olive oil".to_owned(), "ml".to_owned(), 30),
            }
        );
        assert_eq!(detail.author.id, alice);
        assert!(!detail.is_favorited);
        assert!(!detail.is_in_shopping_cart);
    }

    #[test]
    fn amount_bounds_are_inclusive() {
        let mut conn = test_util::test_connection();
        let alice = test_util::user_id(&mut conn, "alice");
        let mut draft = valid_draft(&mut conn);

        for ok in [MIN_AMOUNT, MAX_AMOUNT] {
            draft.ingredients[0].amount = ok;
            create_recipe(&mut conn, alice, &draft).unwrap();
        }
        for bad in [0, 5001] {
            draft.ingredients[0].amount = bad;
            let message = validation_message(create_recipe(&mut conn, alice, &draft));
            assert!(message.contains("between 1 and 5000"), "{message}");
        }
    }

    #[test]
    fn unknown_ingredient_rejected_before_amount() {
        let mut conn = test_util::test_connection();
        let alice = test_util::user_id(&mut conn, "alice");
        let mut draft = valid_draft(&mut conn);
        draft.ingredients.push(IngredientLine {
            ingredient: crate::query::add_ingredient(&mut conn, "ghost", "g").unwrap().id,
            amount: 0,
        });
        {
            use crate::database::schema::ingredients::dsl::*;
            diesel::delete(ingredients.filter(name.eq("ghost")))
                .execute(&mut conn)
                .unwrap();
        }
        let message = validation_message(create_recipe(&mut conn, alice, &draft));
        assert!(message.contains("does not exist"), "{message}");
    }

    #[test]
    fn duplicate_ingredient_rejected() {
        let mut conn = test_util::test_connection();
        let alice = test_util::user_id(&mut conn, "alice");
        let mut draft = valid_draft(&mut conn);
        let line = draft.ingredients[0];
        draft.ingredients.push(line);
        let message = validation_message(create_recipe(&mut conn, alice, &draft));
        assert!(message.contains("more than once"), "{message}");
    }

    #[test]
    fn tag_rules() {
        let mut conn = test_util::test_connection();
        let alice = test_util::user_id(&mut conn, "alice");
        let good = valid_draft(&mut conn);

        let mut untagged = good.clone();
        untagged.tags.clear();
        assert_eq!(
            validation_message(create_recipe(&mut conn, alice, &untagged)),
            "recipe has no tags"
        );

        let mut doubled = good.clone();
        doubled.tags.push(doubled.tags[0]);
        let message = validation_message(create_recipe(&mut conn, alice, &doubled));
        assert!(message.contains("more than once"), "{message}");
    }

    #[test]
    fn cooking_time_must_be_positive() {
        let mut conn = test_util::test_connection();
        let alice = test_util::user_id(&mut conn, "alice");
        let mut draft = valid_draft(&mut conn);
        draft.cooking_time = 0;
        assert_eq!(
            validation_message(create_recipe(&mut conn, alice, &draft)),
            "cooking time must be at least 1 minute"
        );
    }

    #[test]
    fn update_replaces_ingredients_and_tags() {
        let mut conn = test_util::test_connection();
        let alice = test_util::user_id(&mut conn, "alice");
        let draft = valid_draft(&mut conn);
        let created = create_recipe(&mut conn, alice, &draft).unwrap();

        let dinner = test_util::tag(&mut conn, "dinner");
        let salt = test_util::ingredient(&mut conn, "salt", "g");
        let updated = update_recipe(
            &mut conn,
            created.id,
            &RecipeDraft {
                name: "Salted salad".into(),
                text: draft.text.clone(),
                cooking_time: 7,
                image: draft.image.clone(),
                tags: vec![dinner],
                ingredients: vec![IngredientLine { ingredient: salt, amount: 3 }],
            },
        )
        .unwrap();

        assert_eq!(updated.name, "Salted salad");
        assert_eq!(updated.cooking_time, 7);
        let names: Vec<_> = updated.ingredients.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["salt"]);
        let tags: Vec<_> = updated.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(tags, vec!["dinner"]);
    }

    #[test]
    fn rejected_update_leaves_recipe_untouched() {
        let mut conn = test_util::test_connection();
        let alice = test_util::user_id(&mut conn, "alice");
        let draft = valid_draft(&mut conn);
        let created = create_recipe(&mut conn, alice, &draft).unwrap();

        let mut bad = draft.clone();
        bad.ingredients[0].amount = 0;
        update_recipe(&mut conn, created.id, &bad).unwrap_err();

        let recipe = query::find_recipe(&mut conn, created.id).unwrap();
        let detail = recipe_detail(&mut conn, &recipe, &Viewer::Anonymous).unwrap();
        assert_eq!(detail.ingredients.len(), 1);
        assert_eq!(detail.ingredients[0].amount, 200);
    }

    #[test]
    fn delete_cascades_and_checks_permissions() {
        let mut conn = test_util::test_connection();
        let alice = test_util::user(&mut conn, "alice");
        let bob = test_util::user(&mut conn, "bob");
        let draft = valid_draft(&mut conn);
        let created = create_recipe(&mut conn, alice.id, &draft).unwrap();
        crate::favorites::add_favorite(&mut conn, bob.id, created.id).unwrap();
        crate::favorites::add_to_cart(&mut conn, bob.id, created.id).unwrap();

        match delete_recipe(&mut conn, &bob, created.id) {
            Err(Error::Authorization(_)) => {}
            other => panic!("expected authorization error, got {other:?}"),
        }

        delete_recipe(&mut conn, &alice, created.id).unwrap();
        query::find_recipe(&mut conn, created.id).unwrap_err();
        assert!(!query::exists_favorite(&mut conn, bob.id, created.id).unwrap());
        assert!(!query::exists_cart_entry(&mut conn, bob.id, created.id).unwrap());

        {
            use crate::database::schema::ingredient_amounts::dsl::*;
            let count: i64 = ingredient_amounts.count().get_result(&mut conn).unwrap();
            assert_eq!(count, 0);
        }
    }

    #[test]
    fn admin_may_delete_someone_elses_recipe() {
        let mut conn = test_util::test_connection();
        let alice = test_util::user(&mut conn, "alice");
        let draft = valid_draft(&mut conn);
        let created = create_recipe(&mut conn, alice.id, &draft).unwrap();

        let admin = {
            use crate::database::schema::users::dsl::*;
            let bob = test_util::user(&mut conn, "bob");
            diesel::update(users.filter(id.eq(bob.id)))
                .set(is_admin.eq(true))
                .get_result::<crate::database::models::User>(&mut conn)
                .unwrap()
        };

        delete_recipe(&mut conn, &admin, created.id).unwrap();
        query::find_recipe(&mut conn, created.id).unwrap_err();
    }
}
