//! Built-in forum operations and fragments.
//!
//! Every object selection includes `__typename` and `id` where the server
//! type has identity, so results normalize by entity.

use forum_api_types::{POST_TYPENAME, PostInput, UsernamePasswordInput};
use serde_json::json;

use crate::cache::{Field, Fragment, Operation, TYPENAME_FIELD};

pub const ME_FIELD: &str = "me";
pub const POSTS_FIELD: &str = "posts";
pub const POST_FIELD: &str = "post";

fn user_fields() -> Vec<Field> {
    vec![
        Field::scalar(TYPENAME_FIELD),
        Field::scalar("id"),
        Field::scalar("username"),
    ]
}

fn field_error_fields() -> Vec<Field> {
    vec![Field::scalar("field"), Field::scalar("message")]
}

fn user_response_fields() -> Vec<Field> {
    vec![
        Field::object("errors", field_error_fields()),
        Field::object("user", user_fields()),
    ]
}

fn post_snippet_fields() -> Vec<Field> {
    vec![
        Field::scalar(TYPENAME_FIELD),
        Field::scalar("id"),
        Field::scalar("createdAt"),
        Field::scalar("updatedAt"),
        Field::scalar("title"),
        Field::scalar("textSnippet"),
        Field::scalar("points"),
        Field::scalar("voteStatus"),
        Field::object("creator", user_fields()),
    ]
}

/// `query Me { me { ... } }`
pub fn me_query() -> Operation {
    Operation::query("Me", [Field::object(ME_FIELD, user_fields())])
}

/// One page of the post list. `cursor` is the `createdAt` of the last item
/// of the previous page.
pub fn posts_query(limit: i64, cursor: Option<&str>) -> Operation {
    Operation::query(
        "Posts",
        [Field::object(
            POSTS_FIELD,
            [
                Field::scalar(TYPENAME_FIELD),
                Field::scalar("hasMore"),
                Field::object(POSTS_FIELD, post_snippet_fields()),
            ],
        )
        .arg("limit", limit)
        .arg("cursor", cursor)],
    )
}

pub fn post_query(id: i64) -> Operation {
    let mut fields = post_snippet_fields();
    fields.push(Field::scalar("text"));
    Operation::query("Post", [Field::object(POST_FIELD, fields).arg("id", id)])
}

pub fn login_mutation(username_or_email: &str, password: &str) -> Operation {
    Operation::mutation(
        "Login",
        [Field::object("login", user_response_fields())
            .arg("usernameOrEmail", username_or_email)
            .arg("password", password)],
    )
}

pub fn register_mutation(options: &UsernamePasswordInput) -> Operation {
    Operation::mutation(
        "Register",
        [Field::object("register", user_response_fields()).arg(
            "options",
            json!({
                "username": options.username,
                "email": options.email,
                "password": options.password,
            }),
        )],
    )
}

pub fn change_password_mutation(token: &str, new_password: &str) -> Operation {
    Operation::mutation(
        "ChangePassword",
        [Field::object("changePassword", user_response_fields())
            .arg("token", token)
            .arg("newPassword", new_password)],
    )
}

pub fn forgot_password_mutation(email: &str) -> Operation {
    Operation::mutation(
        "ForgotPassword",
        [Field::scalar("forgotPassword").arg("email", email)],
    )
}

pub fn logout_mutation() -> Operation {
    Operation::mutation("Logout", [Field::scalar("logout")])
}

pub fn create_post_mutation(input: &PostInput) -> Operation {
    Operation::mutation(
        "CreatePost",
        [Field::object("createPost", post_snippet_fields())
            .arg("input", json!({ "title": input.title, "text": input.text }))],
    )
}

pub fn update_post_mutation(id: i64, title: &str, text: &str) -> Operation {
    Operation::mutation(
        "UpdatePost",
        [Field::object(
            "updatePost",
            [
                Field::scalar(TYPENAME_FIELD),
                Field::scalar("id"),
                Field::scalar("title"),
                Field::scalar("text"),
                Field::scalar("textSnippet"),
            ],
        )
        .arg("id", id)
        .arg("title", title)
        .arg("text", text)],
    )
}

pub fn delete_post_mutation(id: i64) -> Operation {
    Operation::mutation("DeletePost", [Field::scalar("deletePost").arg("id", id)])
}

pub fn vote_mutation(post_id: i64, value: i64) -> Operation {
    Operation::mutation(
        "Vote",
        [Field::scalar("vote")
            .arg("postId", post_id)
            .arg("value", value)],
    )
}

/// Fields read before applying a vote.
pub fn post_vote_fragment() -> Fragment {
    Fragment::new(
        "_",
        POST_TYPENAME,
        [
            Field::scalar("id"),
            Field::scalar("points"),
            Field::scalar("voteStatus"),
        ],
    )
}

/// Fields written back after applying a vote.
pub fn post_vote_write_fragment() -> Fragment {
    Fragment::new(
        "__",
        POST_TYPENAME,
        [Field::scalar("points"), Field::scalar("voteStatus")],
    )
}
