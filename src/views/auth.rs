use maud::{Markup, html};

use super::Page;
use crate::auth::AuthUser;

fn credentials_form(action: &str, submit: &str) -> Markup {
    html! {
        form class="ui form" action=(action) method="POST" {
            div class="field" {
                label for="username" { "Username" }
                input type="text" id="username" name="username" placeholder="username" required;
            }
            div class="field" {
                label for="password" { "Password" }
                input type="password" id="password" name="password" placeholder="password" required;
            }
            button class="ui primary button" type="submit" { (submit) }
        }
    }
}

pub fn register(user: Option<&AuthUser>) -> Page {
    let content = html! {
        div class="ui segment" {
            h1 { "Sign Up" }
            (credentials_form("/register", "Sign Up"))
        }
    };
    Page::new("Sign Up", user, content)
}

pub fn login(user: Option<&AuthUser>) -> Page {
    let content = html! {
        div class="ui segment" {
            h1 { "Login" }
            (credentials_form("/login", "Login"))
        }
    };
    Page::new("Login", user, content)
}
