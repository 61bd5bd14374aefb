use maud::{Markup, PreEscaped, html};

use super::Page;
use crate::{
    auth::AuthUser,
    method_override::OVERRIDE_FIELD,
    models::{Blog, BlogForm},
    sanitizer,
};

// Characters of body text shown per post on the index page.
const EXCERPT_CHARS: usize = 100;

fn blog_path(blog: &Blog) -> String {
    format!("/blogs/{}", blog.id)
}

fn posted_on(blog: &Blog) -> String {
    blog.created_at.format("%B %-d, %Y").to_string()
}

pub fn index(user: Option<&AuthUser>, blogs: &[Blog]) -> Page {
    let content = html! {
        div class="ui top attached segment" {
            div class="ui huge header" { "Blog Posts" }
            @if blogs.is_empty() {
                p class="empty" { "No posts yet." }
            }
            div class="ui divided items" {
                @for blog in blogs {
                    div class="item" {
                        div class="image" {
                            img src=(blog.image) alt=(blog.title);
                        }
                        div class="content" {
                            a class="header" href=(blog_path(blog)) { (blog.title) }
                            div class="meta" { span { (posted_on(blog)) } }
                            div class="description" {
                                p { (sanitizer::excerpt(&blog.body, EXCERPT_CHARS)) }
                            }
                            div class="extra" {
                                a class="ui floated basic violet button" href=(blog_path(blog)) {
                                    "Read More"
                                }
                            }
                        }
                    }
                }
            }
        }
    };
    Page::new("Blog Posts", user, content)
}

/// Shared by the new and edit pages. `action` is where the form posts to.
fn blog_form(action: &str, method: Option<&str>, form: &BlogForm, submit: &str) -> Markup {
    html! {
        form class="ui form" action=(action) method="POST" {
            @if let Some(method) = method {
                input type="hidden" name=(OVERRIDE_FIELD) value=(method);
            }
            div class="field" {
                label for="title" { "Title" }
                input type="text" id="title" name="title" placeholder="title" value=(form.title);
            }
            div class="field" {
                label for="image" { "Image" }
                input type="text" id="image" name="image" placeholder="image" value=(form.image);
            }
            div class="field" {
                label for="body" { "Blog Content" }
                textarea id="body" name="body" { (form.body) }
            }
            input class="ui violet big basic button" type="submit" value=(submit);
        }
    }
}

pub fn new(user: Option<&AuthUser>, form: &BlogForm) -> Page {
    let content = html! {
        div class="ui main text container segment" {
            div class="ui huge header" { "New Blog" }
            (blog_form("/blogs", None, form, "Submit"))
        }
    };
    Page::new("New Blog", user, content)
}

pub fn show(user: Option<&AuthUser>, blog: &Blog) -> Page {
    let content = html! {
        div class="ui huge header" { (blog.title) }
        div class="ui top attached segment" {
            div class="item" {
                img class="ui centered rounded image" src=(blog.image) alt=(blog.title);
                div class="content" {
                    span { (posted_on(blog)) }
                }
                div class="description" {
                    // Stored bodies have already been through the sanitizer.
                    (PreEscaped(&blog.body))
                }
                a class="ui orange basic button" href={ (blog_path(blog)) "/edit" } { "Edit" }
                form id="delete" action=(blog_path(blog)) method="POST" {
                    input type="hidden" name=(OVERRIDE_FIELD) value="DELETE";
                    button class="ui red basic button" type="submit" { "Delete" }
                }
            }
        }
    };
    Page::new(blog.title.clone(), user, content)
}

pub fn edit(user: Option<&AuthUser>, blog: &Blog) -> Page {
    let form = BlogForm {
        title: blog.title.clone(),
        image: blog.image.clone(),
        body: blog.body.clone(),
    };
    let action = blog_path(blog);
    let content = html! {
        div class="ui main text container segment" {
            div class="ui huge header" { "Edit " (blog.title) }
            (blog_form(&action, Some("PUT"), &form, "Update"))
        }
    };
    Page::new(format!("Edit {}", blog.title), user, content)
}
