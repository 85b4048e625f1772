use crate::database;
use crate::database::models::{Follow, RecipeBrief, User, UserId};
use crate::error::{Error, Result};
use crate::projection::{user_profile, UserProfile, Viewer};
use crate::query;
use diesel::ExpressionMethods as _;
use diesel::JoinOnDsl as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use serde::Serialize;

/// Subscribes `user` to `author`'s recipes. Self-follow is rejected before
/// anything is looked up; the constraint is authoritative here, not in the
/// schema.
pub fn follow(conn: &mut database::Connection, user: UserId, author: UserId) -> Result<UserProfile> {
    use database::schema::follows::dsl::*;
    use diesel::insert_into;

    if user == author {
        return Err(Error::validation("cannot subscribe to yourself"));
    }
    let author_user = query::find_user(conn, author)?;
    if query::exists_follow(conn, user, author)? {
        return Err(Error::conflict("already subscribed to this author"));
    }
    insert_into(follows)
        .values(Follow {
            user_id: user,
            author_id: author,
        })
        .execute(conn)?;
    user_profile(conn, &author_user, &Viewer::User(user))
}

pub fn unfollow(conn: &mut database::Connection, user: UserId, author: UserId) -> Result<()> {
    use database::schema::follows::dsl::*;
    use diesel::delete;

    let removed = delete(follows.filter(user_id.eq(user)).filter(author_id.eq(author)))
        .execute(conn)?;
    if removed == 0 {
        return Err(Error::not_found("not subscribed to this author"));
    }
    Ok(())
}

/// One followed author with their recipes, as shown on the subscriptions
/// page.
#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
    pub author: UserProfile,
    pub recipes: Vec<RecipeBrief>,
    pub recipes_count: i64,
}

pub fn subscriptions(
    conn: &mut database::Connection,
    user: UserId,
    recipes_limit: Option<i64>,
) -> Result<Vec<Subscription>> {
    use database::schema::{follows, recipes, users};

    let authors: Vec<User> = users::table
        .inner_join(follows::table.on(follows::author_id.eq(users::id)))
        .filter(follows::user_id.eq(user))
        .order(users::username.asc())
        .select(User::as_select())
        .load(conn)?;

    let mut result = Vec::with_capacity(authors.len());
    for author in authors {
        let mut briefs = recipes::table
            .filter(recipes::author_id.eq(author.id))
            .order((recipes::pub_date.desc(), recipes::id.desc()))
            .select(RecipeBrief::as_select())
            .into_boxed();
        if let Some(limit) = recipes_limit {
            briefs = briefs.limit(limit);
        }
        let briefs = briefs.load(conn)?;
        let recipes_count: i64 = recipes::table
            .filter(recipes::author_id.eq(author.id))
            .count()
            .get_result(conn)?;
        result.push(Subscription {
            author: user_profile(conn, &author, &Viewer::User(user))?,
            recipes: briefs,
            recipes_count,
        });
    }
    Ok(result)
}
