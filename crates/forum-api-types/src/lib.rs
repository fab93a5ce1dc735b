//! Shared request and response types for the forum GraphQL API.
//!
//! These mirror the payloads the server returns for account and post
//! mutations, so cache policies and form code decode the same shapes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const USER_TYPENAME: &str = "User";
pub const POST_TYPENAME: &str = "Post";

fn user_typename() -> String {
    USER_TYPENAME.to_string()
}

/// A validation failure attached to one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// The `RegularUser` selection returned by account mutations and `me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "__typename", default = "user_typename")]
    pub typename: String,
    pub id: i64,
    pub username: String,
}

impl User {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            typename: user_typename(),
            id,
            username: username.into(),
        }
    }
}

/// Payload of `login`, `register` and `changePassword`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    #[serde(default)]
    pub errors: Option<Vec<FieldError>>,
    #[serde(default)]
    pub user: Option<User>,
}

impl UserResponse {
    /// True when the server reported at least one field error.
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|errors| !errors.is_empty())
    }

    /// The authenticated user, only when the mutation succeeded.
    pub fn authenticated_user(&self) -> Option<&User> {
        if self.has_errors() {
            return None;
        }
        self.user.as_ref()
    }
}

/// Arguments of the `vote` mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteArgs {
    pub post_id: i64,
    pub value: i64,
}

/// Arguments of the `deletePost` mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePostArgs {
    pub id: i64,
}

/// Arguments of the `posts` list query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostsArgs {
    pub limit: i64,
    #[serde(default)]
    pub cursor: Option<String>,
}

/// Input object of the `register` mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernamePasswordInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Input object of the `createPost` mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub text: String,
}

/// Collapse field errors into a field -> message map for form display.
///
/// When a field is reported more than once the last message wins.
pub fn to_error_map(errors: &[FieldError]) -> HashMap<String, String> {
    errors
        .iter()
        .map(|error| (error.field.clone(), error.message.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn error_map_keeps_last_message_per_field() {
        let errors = vec![
            FieldError {
                field: "username".to_string(),
                message: "too short".to_string(),
            },
            FieldError {
                field: "password".to_string(),
                message: "incorrect password".to_string(),
            },
            FieldError {
                field: "username".to_string(),
                message: "already taken".to_string(),
            },
        ];

        let map = to_error_map(&errors);
        assert_eq!(map.len(), 2);
        assert_eq!(map["username"], "already taken");
        assert_eq!(map["password"], "incorrect password");
    }

    #[test]
    fn user_response_with_errors_is_not_authenticated() {
        let response: UserResponse = serde_json::from_value(json!({
            "errors": [{ "field": "password", "message": "incorrect password" }],
            "user": null
        }))
        .expect("decode response");

        assert!(response.has_errors());
        assert!(response.authenticated_user().is_none());
    }

    #[test]
    fn user_response_defaults_typename() {
        let response: UserResponse = serde_json::from_value(json!({
            "errors": null,
            "user": { "id": 3, "username": "ben" }
        }))
        .expect("decode response");

        let user = response.authenticated_user().expect("user");
        assert_eq!(user.typename, USER_TYPENAME);
        assert_eq!(user, &User::new(3, "ben"));
    }

    #[test]
    fn vote_args_use_camel_case() {
        let args: VoteArgs =
            serde_json::from_value(json!({ "postId": 9, "value": -1 })).expect("decode args");
        assert_eq!(args, VoteArgs { post_id: 9, value: -1 });
    }
}
