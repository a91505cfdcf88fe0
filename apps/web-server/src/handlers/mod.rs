//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;

use actix_web::{HttpResponse, http::header, web};

use crate::middleware::error::{AppError, AppResult};

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::NotFound(err.to_string()).into()),
    )
    .route("/health", web::get().to(health::health_check))
    // Blog pages
    .route("/", web::get().to(posts::index))
    .route("/group/{slug}/", web::get().to(posts::group_posts))
    .route("/profile/{username}/", web::get().to(posts::profile))
    .route("/posts/{id}/", web::get().to(posts::post_detail))
    .service(
        web::resource("/posts/{id}/edit/")
            .route(web::get().to(posts::edit_form))
            .route(web::post().to(posts::edit_submit)),
    )
    .service(
        web::resource("/create/")
            .route(web::get().to(posts::create_form))
            .route(web::post().to(posts::create_submit)),
    )
    // Auth routes
    .service(
        web::scope("/auth")
            .service(
                web::resource("/signup/")
                    .route(web::get().to(auth::signup_form))
                    .route(web::post().to(auth::signup_submit)),
            )
            .service(
                web::resource("/login/")
                    .route(web::get().to(auth::login_form))
                    .route(web::post().to(auth::login_submit)),
            )
            .service(
                web::resource("/logout/")
                    .route(web::get().to(auth::logout))
                    .route(web::post().to(auth::logout)),
            ),
    )
    .default_service(web::to(not_found));
}

async fn not_found(req: actix_web::HttpRequest) -> AppResult<HttpResponse> {
    Err(AppError::NotFound(format!("no route for {}", req.path())))
}

/// `302 Found` to `location`.
pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

#[cfg(test)]
mod tests {
    use actix_web::cookie::Cookie;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use async_trait::async_trait;
    use std::sync::Arc;
    use uuid::Uuid;

    use blogpad_core::BlogSettings;
    use blogpad_core::domain::{Group, Post, PostFilter, User};
    use blogpad_core::error::RepoError;
    use blogpad_core::ports::{BaseRepository, PasswordService, PostRepository, UserRepository};
    use blogpad_infra::{Argon2PasswordService, InMemoryStore, JwtConfig};
    use blogpad_shared::dto::{LoginFormData, PostFormData, SignupFormData};

    use super::*;
    use crate::middleware::auth::SESSION_COOKIE;
    use crate::state::AppState;

    const PASSWORD: &str = "correct-horse";
    const CARD: &str = "class=\"post-card\"";

    struct Fixture {
        store: InMemoryStore,
        state: AppState,
        author: User,
        reader: User,
        group: Group,
    }

    impl Fixture {
        async fn new() -> Self {
            let store = InMemoryStore::new();
            let state = AppState::in_memory(&store, BlogSettings::default(), JwtConfig::default());

            let hash = Argon2PasswordService::new().hash(PASSWORD).unwrap();
            let author = store
                .users()
                .insert(User::new("Author".to_string(), hash.clone()))
                .await
                .unwrap();
            let reader = store
                .users()
                .insert(User::new("Dzhordzh".to_string(), hash))
                .await
                .unwrap();
            let group = store
                .groups()
                .insert(Group::new("Test group", "test-slug", "Test description").unwrap())
                .await
                .unwrap();

            Self {
                store,
                state,
                author,
                reader,
                group,
            }
        }

        async fn publish(&self, text: &str, group: bool) -> Post {
            let group_id = group.then_some(self.group.id);
            self.store
                .posts()
                .insert(Post::new(self.author.id, text.to_string(), group_id))
                .await
                .unwrap()
        }

        fn session(&self, user: &User) -> Cookie<'static> {
            let token = self
                .state
                .tokens
                .generate_token(user.id, &user.username)
                .unwrap();
            Cookie::new(SESSION_COOKIE, token)
        }

        async fn post_count(&self) -> u64 {
            self.store.posts().count(PostFilter::All).await.unwrap()
        }

        async fn stored(&self, id: Uuid) -> Post {
            self.store.posts().find_by_id(id).await.unwrap().unwrap()
        }
    }

    /// A user table whose backing database is unreachable.
    struct UnavailableUsers;

    fn unavailable() -> RepoError {
        RepoError::Connection("connection refused".to_string())
    }

    #[async_trait]
    impl BaseRepository<User, Uuid> for UnavailableUsers {
        async fn find_by_id(&self, _id: Uuid) -> Result<Option<User>, RepoError> {
            Err(unavailable())
        }

        async fn insert(&self, _entity: User) -> Result<User, RepoError> {
            Err(unavailable())
        }

        async fn update(&self, _entity: User) -> Result<User, RepoError> {
            Err(unavailable())
        }

        async fn delete(&self, _id: Uuid) -> Result<(), RepoError> {
            Err(unavailable())
        }
    }

    #[async_trait]
    impl UserRepository for UnavailableUsers {
        async fn find_by_username(&self, _username: &str) -> Result<Option<User>, RepoError> {
            Err(unavailable())
        }
    }

    macro_rules! app {
        ($fixture:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($fixture.state.clone()))
                    .configure(configure_routes),
            )
            .await
        };
    }

    fn location(resp: &actix_web::dev::ServiceResponse) -> String {
        resp.headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    fn has_session_cookie(resp: &actix_web::dev::ServiceResponse) -> bool {
        resp.response()
            .cookies()
            .any(|c| c.name() == SESSION_COOKIE && !c.value().is_empty())
    }

    async fn body_text(resp: actix_web::dev::ServiceResponse) -> String {
        let body = test::read_body(resp).await;
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[actix_web::test]
    async fn test_public_pages_render() {
        let fx = Fixture::new().await;
        let post = fx.publish("Test post text", true).await;
        let app = app!(fx);

        for uri in [
            "/".to_string(),
            "/group/test-slug/".to_string(),
            "/profile/Author/".to_string(),
            format!("/posts/{}/", post.id),
            "/auth/login/".to_string(),
            "/auth/signup/".to_string(),
            "/health".to_string(),
        ] {
            let req = test::TestRequest::get().uri(&uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK, "GET {uri}");
        }
    }

    #[actix_web::test]
    async fn test_missing_pages_are_404() {
        let fx = Fixture::new().await;
        let app = app!(fx);

        for uri in [
            "/unexisting_page/".to_string(),
            "/group/no-such-group/".to_string(),
            "/profile/nobody/".to_string(),
            "/posts/not-a-uuid/".to_string(),
            format!("/posts/{}/", Uuid::new_v4()),
        ] {
            let req = test::TestRequest::get().uri(&uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::NOT_FOUND, "GET {uri}");
            assert!(body_text(resp).await.contains("Page not found"));
        }
    }

    #[actix_web::test]
    async fn test_anonymous_is_sent_to_login() {
        let fx = Fixture::new().await;
        let post = fx.publish("Test post text", false).await;
        let app = app!(fx);

        let req = test::TestRequest::get().uri("/create/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/auth/login/?next=/create/");

        let edit = format!("/posts/{}/edit/", post.id);
        let req = test::TestRequest::post()
            .uri(&edit)
            .set_form(PostFormData {
                text: "Hijacked".to_string(),
                group: None,
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(location(&resp), format!("/auth/login/?next={edit}"));
        assert_eq!(fx.stored(post.id).await.text, "Test post text");
    }

    #[actix_web::test]
    async fn test_create_post_redirects_to_profile() {
        let fx = Fixture::new().await;
        let app = app!(fx);
        let before = fx.post_count().await;

        let req = test::TestRequest::post()
            .uri("/create/")
            .cookie(fx.session(&fx.author))
            .set_form(PostFormData {
                text: "Brand new post".to_string(),
                group: Some(fx.group.id.to_string()),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/profile/Author/");
        assert_eq!(fx.post_count().await, before + 1);

        let in_group = fx
            .store
            .posts()
            .list(PostFilter::Group(fx.group.id), 0, 10)
            .await
            .unwrap();
        assert_eq!(in_group.len(), 1);
        assert_eq!(in_group[0].post.text, "Brand new post");
        assert_eq!(in_group[0].author.id, fx.author.id);
    }

    #[actix_web::test]
    async fn test_invalid_create_redisplays_form() {
        let fx = Fixture::new().await;
        let app = app!(fx);

        let req = test::TestRequest::post()
            .uri("/create/")
            .cookie(fx.session(&fx.author))
            .set_form(PostFormData {
                text: "   ".to_string(),
                group: Some("not-a-group".to_string()),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_text(resp).await;
        assert!(body.contains("This field is required."));
        assert!(body.contains("Select a valid choice."));
        assert_eq!(fx.post_count().await, 0);
    }

    #[actix_web::test]
    async fn test_create_form_renders_for_user() {
        let fx = Fixture::new().await;
        let app = app!(fx);

        let req = test::TestRequest::get()
            .uri("/create/")
            .cookie(fx.session(&fx.reader))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_text(resp).await;
        assert!(body.contains("New post"));
        assert!(body.contains("Test group"));
    }

    #[actix_web::test]
    async fn test_author_edits_in_place() {
        let fx = Fixture::new().await;
        let post = fx.publish("Original text", true).await;
        let app = app!(fx);
        let edit = format!("/posts/{}/edit/", post.id);

        let req = test::TestRequest::get()
            .uri(&edit)
            .cookie(fx.session(&fx.author))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_text(resp).await;
        assert!(body.contains("Edit post"));
        assert!(body.contains("Original text"));

        let req = test::TestRequest::post()
            .uri(&edit)
            .cookie(fx.session(&fx.author))
            .set_form(PostFormData {
                text: "Edited text".to_string(),
                group: Some(String::new()),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), format!("/posts/{}/", post.id));
        assert_eq!(fx.post_count().await, 1);

        let saved = fx.stored(post.id).await;
        assert_eq!(saved.text, "Edited text");
        assert_eq!(saved.group_id, None);
        assert_eq!(saved.pub_date, post.pub_date);
        assert_eq!(saved.author_id, fx.author.id);
    }

    #[actix_web::test]
    async fn test_non_author_edit_is_noop() {
        let fx = Fixture::new().await;
        let post = fx.publish("Original text", true).await;
        let app = app!(fx);
        let edit = format!("/posts/{}/edit/", post.id);

        let req = test::TestRequest::get()
            .uri(&edit)
            .cookie(fx.session(&fx.reader))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), format!("/posts/{}/", post.id));

        let req = test::TestRequest::post()
            .uri(&edit)
            .cookie(fx.session(&fx.reader))
            .set_form(PostFormData {
                text: "Hijacked".to_string(),
                group: None,
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), format!("/posts/{}/", post.id));

        let unchanged = fx.stored(post.id).await;
        assert_eq!(unchanged.text, "Original text");
        assert_eq!(unchanged.group_id, Some(fx.group.id));
    }

    #[actix_web::test]
    async fn test_invalid_edit_keeps_edit_mode() {
        let fx = Fixture::new().await;
        let post = fx.publish("Original text", false).await;
        let app = app!(fx);

        let req = test::TestRequest::post()
            .uri(&format!("/posts/{}/edit/", post.id))
            .cookie(fx.session(&fx.author))
            .set_form(PostFormData {
                text: "x".repeat(101),
                group: None,
            })
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_text(resp).await;
        assert!(body.contains("Edit post"));
        assert!(body.contains("at most 100 characters"));
        assert_eq!(fx.stored(post.id).await.text, "Original text");
    }

    #[actix_web::test]
    async fn test_edit_link_only_for_author() {
        let fx = Fixture::new().await;
        let post = fx.publish("Test post text", false).await;
        let app = app!(fx);
        let detail = format!("/posts/{}/", post.id);
        let edit_link = format!("/posts/{}/edit/", post.id);

        let req = test::TestRequest::get()
            .uri(&detail)
            .cookie(fx.session(&fx.author))
            .to_request();
        let body = body_text(test::call_service(&app, req).await).await;
        assert!(body.contains(&edit_link));

        let req = test::TestRequest::get()
            .uri(&detail)
            .cookie(fx.session(&fx.reader))
            .to_request();
        let body = body_text(test::call_service(&app, req).await).await;
        assert!(!body.contains(&edit_link));
    }

    #[actix_web::test]
    async fn test_listings_paginate_ten_then_five() {
        let fx = Fixture::new().await;
        for i in 0..15 {
            fx.publish(&format!("Post number {i}"), true).await;
        }
        let app = app!(fx);

        for base in ["/", "/group/test-slug/", "/profile/Author/"] {
            for (page, expected) in [("1", 10), ("2", 5)] {
                let req = test::TestRequest::get()
                    .uri(&format!("{base}?page={page}"))
                    .to_request();
                let resp = test::call_service(&app, req).await;
                assert_eq!(resp.status(), StatusCode::OK);
                let body = body_text(resp).await;
                assert_eq!(body.matches(CARD).count(), expected, "{base} page {page}");
            }
        }
    }

    #[actix_web::test]
    async fn test_bad_page_values_fall_back() {
        let fx = Fixture::new().await;
        for i in 0..15 {
            fx.publish(&format!("Post number {i}"), false).await;
        }
        let app = app!(fx);

        for (query, expected) in [
            ("page=abc", 10),
            ("page=0", 10),
            ("page=99", 5),
            ("page=99999999999999999999", 5),
            ("page=%FF", 10),
            ("page=1&page=2", 5),
            ("page=2&page=1", 10),
        ] {
            let req = test::TestRequest::get()
                .uri(&format!("/?{query}"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK, "{query}");
            let body = body_text(resp).await;
            assert_eq!(body.matches(CARD).count(), expected, "{query}");
        }
    }

    #[actix_web::test]
    async fn test_signup_logs_in() {
        let fx = Fixture::new().await;
        let app = app!(fx);

        let req = test::TestRequest::post()
            .uri("/auth/signup/")
            .set_form(SignupFormData {
                username: "newcomer".to_string(),
                password1: PASSWORD.to_string(),
                password2: PASSWORD.to_string(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/");
        assert!(has_session_cookie(&resp));
        assert!(
            fx.store
                .users()
                .find_by_username("newcomer")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[actix_web::test]
    async fn test_signup_rejects_taken_username() {
        let fx = Fixture::new().await;
        let app = app!(fx);

        let req = test::TestRequest::post()
            .uri("/auth/signup/")
            .set_form(SignupFormData {
                username: "Author".to_string(),
                password1: PASSWORD.to_string(),
                password2: PASSWORD.to_string(),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!has_session_cookie(&resp));
        assert!(body_text(resp).await.contains("already exists"));
    }

    #[actix_web::test]
    async fn test_login_follows_next() {
        let fx = Fixture::new().await;
        let app = app!(fx);

        let req = test::TestRequest::post()
            .uri("/auth/login/")
            .set_form(LoginFormData {
                username: "Author".to_string(),
                password: "wrong-password".to_string(),
                next: Some("/create/".to_string()),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!has_session_cookie(&resp));
        assert!(body_text(resp).await.contains("Please enter a correct username"));

        let req = test::TestRequest::post()
            .uri("/auth/login/")
            .set_form(LoginFormData {
                username: "Author".to_string(),
                password: PASSWORD.to_string(),
                next: Some("/create/".to_string()),
            })
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/create/");
        assert!(has_session_cookie(&resp));
    }

    #[actix_web::test]
    async fn test_logout_clears_session() {
        let fx = Fixture::new().await;
        let app = app!(fx);

        let req = test::TestRequest::post()
            .uri("/auth/logout/")
            .cookie(fx.session(&fx.author))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::FOUND);
        assert!(
            resp.response()
                .cookies()
                .any(|c| c.name() == SESSION_COOKIE && c.value().is_empty())
        );
    }

    #[actix_web::test]
    async fn test_stale_session_is_anonymous() {
        let fx = Fixture::new().await;
        let app = app!(fx);
        let ghost = User::new("ghost".to_string(), String::new());

        let req = test::TestRequest::get()
            .uri("/create/")
            .cookie(fx.session(&ghost))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), "/auth/login/?next=/create/");

        let req = test::TestRequest::get()
            .uri("/create/")
            .cookie(Cookie::new(SESSION_COOKIE, "garbage"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(location(&resp), "/auth/login/?next=/create/");
    }

    #[actix_web::test]
    async fn test_session_lookup_failure_is_not_anonymous() {
        let mut fx = Fixture::new().await;
        let cookie = fx.session(&fx.author);
        fx.state.users = Arc::new(UnavailableUsers);
        let app = app!(fx);

        let req = test::TestRequest::get().uri("/").cookie(cookie).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let req = test::TestRequest::get().uri("/").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
