//! Server-rendered pages.
//!
//! Every page goes through [`Page`], which wraps the content in the shared layout and
//! receives the current user explicitly.

use maud::{DOCTYPE, Markup, Render, html};

use crate::auth::AuthUser;

pub mod auth;
pub mod blogs;

const STYLESHEET: &str = "https://cdnjs.cloudflare.com/ajax/libs/semantic-ui/2.5.0/semantic.min.css";

pub struct Page {
    pub title: String,
    pub current_user: Option<AuthUser>,
    pub content: Markup,
}

impl Page {
    pub fn new(title: impl Into<String>, current_user: Option<&AuthUser>, content: Markup) -> Self {
        Self {
            title: title.into(),
            current_user: current_user.cloned(),
            content,
        }
    }
}

impl Render for Page {
    fn render(&self) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" {
                head {
                    meta charset="utf-8";
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    title { (self.title) " | Blog" }
                    link rel="stylesheet" href=(STYLESHEET);
                }
                body {
                    (Nav { current_user: self.current_user.as_ref() })
                    main class="ui main text container" {
                        (self.content)
                    }
                }
            }
        }
    }
}

impl axum::response::IntoResponse for Page {
    fn into_response(self) -> axum::response::Response {
        self.render().into_response()
    }
}

struct Nav<'a> {
    current_user: Option<&'a AuthUser>,
}

impl Render for Nav<'_> {
    fn render(&self) -> Markup {
        html! {
            nav class="ui fixed inverted menu" {
                div class="ui container" {
                    a class="header item" href="/blogs" { "Blog" }
                    a class="item" href="/blogs" { "Home" }
                    @if self.current_user.is_some() {
                        a class="item" href="/blogs/new" { "New Post" }
                    }
                    div class="right menu" {
                        @match self.current_user {
                            Some(user) => {
                                span class="item" { "Signed in as " strong { (user.username) } }
                                a class="item" href="/logout" { "Logout" }
                            }
                            None => {
                                a class="item" href="/login" { "Login" }
                                a class="item" href="/register" { "Sign Up" }
                            }
                        }
                    }
                }
            }
        }
    }
}
