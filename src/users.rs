// Copyright 2026 Remi Bernotavicius

use crate::database;
use crate::database::models::{NewUser, User};
use crate::error::{Error, Result};
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use regex::Regex;
use std::sync::OnceLock;

static USERNAME_PATTERN: OnceLock<Regex> = OnceLock::new();

fn username_pattern() -> &'static Regex {
    USERNAME_PATTERN.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("hard-coded pattern"))
}

/// "me" is reserved by the gateway for the current-user route.
pub fn validate_username(value: &str) -> Result<()> {
    if value.eq_ignore_ascii_case("me") {
        return Err(Error::validation("username \"me\" is reserved"));
    }
    if !username_pattern().is_match(value) {
        return Err(Error::validation(
            "username may only contain letters, digits and . @ + - _",
        ));
    }
    Ok(())
}

/// Registers a user record. The password hash comes from the auth
/// collaborator; this layer only enforces username shape and uniqueness.
pub fn create_user(conn: &mut database::Connection, new_user: NewUser) -> Result<User> {
    use database::schema::users::dsl::*;
    use diesel::dsl::exists;
    use diesel::insert_into;

    validate_username(&new_user.username)?;

    if diesel::select(exists(users.filter(email.eq(&new_user.email)))).get_result(conn)? {
        return Err(Error::conflict("a user with this email already exists"));
    }
    if diesel::select(exists(users.filter(username.eq(&new_user.username)))).get_result(conn)? {
        return Err(Error::conflict("this username is already taken"));
    }

    Ok(insert_into(users).values(new_user).get_result(conn)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_util;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            username: username.into(),
            first_name: "A".into(),
            last_name: "B".into(),
            password: "hash".into(),
        }
    }

    #[test]
    fn username_shape() {
        validate_username("alice.cook+1@home_42").unwrap();
        validate_username("me").unwrap_err();
        validate_username("Me").unwrap_err();
        validate_username("bad name").unwrap_err();
        validate_username("").unwrap_err();
    }

    #[test]
    fn registration_enforces_uniqueness() {
        let mut conn = test_util::test_connection();
        let user = create_user(&mut conn, new_user("alice", "a@example.com")).unwrap();
        assert!(user.is_active);
        assert!(!user.is_admin);

        match create_user(&mut conn, new_user("alice", "other@example.com")) {
            Err(Error::Conflict(message)) => assert_eq!(message, "this username is already taken"),
            other => panic!("expected conflict, got {other:?}"),
        }
        match create_user(&mut conn, new_user("alice2", "a@example.com")) {
            Err(Error::Conflict(message)) => {
                assert_eq!(message, "a user with this email already exists")
            }
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}
