//! Server-rendered HTML pages. Presentation only; every page is built from
//! documents the request handling core already validated.

use mongodb::bson::Document;

/// Minimal HTML escaping for text and attribute positions.
fn escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n\
         <nav><a href=\"/\">Home</a> | <a href=\"/apod\">Today's picture</a> | \
         <a href=\"/pictures?type=favorites\">Favorites</a> | \
         <a href=\"/pictures?type=last_seen\">Last seen</a></nav>\n{}\n</body>\n</html>\n",
        escape(title),
        body
    )
}

fn favorites_list(favorites: &[Document]) -> String {
    if favorites.is_empty() {
        return "<p>No favorites yet.</p>".to_string();
    }
    let items: String = favorites
        .iter()
        .map(|fav| {
            let url = fav.get_str("url").unwrap_or_default();
            let title = fav.get_str("title").unwrap_or_default();
            format!(
                "<li><a href=\"{}\">{}</a></li>\n",
                escape(url),
                escape(title)
            )
        })
        .collect();
    format!("<ul>\n{items}</ul>")
}

pub fn home_page(favorites: &[Document]) -> String {
    page(
        "NASA Pictures",
        &format!("<h1>Favorite pictures</h1>\n{}", favorites_list(favorites)),
    )
}

pub fn favorites_page(favorites: &[Document]) -> String {
    let add_form = "<form method=\"post\" action=\"/favorites\">\n\
         <input name=\"url\" placeholder=\"Picture URL\">\n\
         <input name=\"title\" placeholder=\"Title\">\n\
         <button type=\"submit\">Add favorite</button>\n</form>";
    page(
        "Favorites",
        &format!(
            "<h1>Favorites</h1>\n{}\n{}",
            favorites_list(favorites),
            add_form
        ),
    )
}

pub fn apod_page(record: &Document) -> String {
    let url = record.get_str("url").unwrap_or_default();
    let title = record.get_str("title").unwrap_or_default();
    let explanation = record.get_str("explanation").unwrap_or_default();
    let save_form = format!(
        "<form method=\"post\" action=\"/favorites\">\n\
         <input type=\"hidden\" name=\"url\" value=\"{}\">\n\
         <input type=\"hidden\" name=\"title\" value=\"{}\">\n\
         <button type=\"submit\">Save as favorite</button>\n</form>",
        escape(url),
        escape(title)
    );
    page(
        "Astronomy Picture of the Day",
        &format!(
            "<h1>{}</h1>\n<img src=\"{}\" alt=\"{}\">\n<p>{}</p>\n{}",
            escape(title),
            escape(url),
            escape(title),
            escape(explanation),
            save_form
        ),
    )
}

pub fn last_seen_page(pictures: &[Document]) -> String {
    let items: String = pictures
        .iter()
        .map(|pic| {
            let url = pic.get_str("url").unwrap_or_default();
            let title = pic.get_str("title").unwrap_or_default();
            format!(
                "<li><a href=\"{}\">{}</a>\n\
                 <form method=\"post\" action=\"/last-seen/delete\">\n\
                 <input type=\"hidden\" name=\"url\" value=\"{}\">\n\
                 <button type=\"submit\">Delete</button>\n</form></li>\n",
                escape(url),
                escape(title),
                escape(url)
            )
        })
        .collect();
    let body = if pictures.is_empty() {
        "<p>No pictures seen yet.</p>".to_string()
    } else {
        format!("<ul>\n{items}</ul>")
    };
    page("Last seen pictures", &format!("<h1>Last seen</h1>\n{body}"))
}
