//! Starter theme written by `plume init`

/// Files of the starter site as `(relative path, contents)`
pub const STARTER_FILES: &[(&str, &str)] = &[
    ("_config.yml", include_str!("starter/_config.yml")),
    ("_layouts/default.html", include_str!("starter/_layouts/default.html")),
    ("_layouts/post.html", include_str!("starter/_layouts/post.html")),
    ("_layouts/home.html", include_str!("starter/_layouts/home.html")),
    ("_includes/head.html", include_str!("starter/_includes/head.html")),
    (
        "_includes/post-summary.html",
        include_str!("starter/_includes/post-summary.html"),
    ),
    ("assets/main.css", include_str!("starter/assets/main.css")),
];

/// The sample post, with `{{ date }}` left for the caller to fill
pub const WELCOME_POST: &str = include_str!("starter/_posts/welcome.md");
