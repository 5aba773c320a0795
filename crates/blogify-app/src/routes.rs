//! Pages the application can navigate to.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Login,
    SignUp,
    CreateBlog,
    UserBlog,
    Dashboard,
    ExplorePost,
}

impl Route {
    pub const ALL: [Route; 7] = [
        Route::Home,
        Route::Login,
        Route::SignUp,
        Route::CreateBlog,
        Route::UserBlog,
        Route::Dashboard,
        Route::ExplorePost,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Login => "/auth/login",
            Route::SignUp => "/auth/signup",
            Route::CreateBlog => "/createblog",
            Route::UserBlog => "/userblog",
            Route::Dashboard => "/dashboard",
            Route::ExplorePost => "/explorepost",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        Self::ALL.into_iter().find(|route| route.path() == path)
    }

    /// Pages that only make sense with a signed-in user.
    pub fn requires_auth(self) -> bool {
        matches!(self, Route::CreateBlog | Route::Dashboard)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(Route::from_path("/userblog"), Some(Route::UserBlog));
        assert_eq!(Route::from_path("/auth/login/"), Some(Route::Login));
        assert_eq!(Route::from_path("/?code=abc"), Some(Route::Home));
        assert_eq!(Route::from_path("/contact"), None);
    }

    #[test]
    fn test_paths_are_unique() {
        for route in Route::ALL {
            assert_eq!(Route::from_path(route.path()), Some(route));
        }
    }
}
