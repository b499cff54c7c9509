//! End-to-end grant flows driven the way a protocol engine calls the adapter.

#![allow(clippy::expect_used, clippy::panic)]

use authkv_oauth::{
    AccessToken, AccessTokenGenerator, AuthorizationCode, AuthorizeTokenGenerator,
    CountingAccessTokenGenerator, CountingAuthorizeTokenGenerator, EntityKind, OAuthResult,
    OAuthStorage, assert_not_found,
    testutil::{SAMPLE_REDIRECT_URI, default_storage, sample_access, sample_client},
};

/// Minimal engine: just enough of the code and refresh grants to drive the
/// storage calls in the order a real server makes them.
struct Engine<'a, S: OAuthStorage> {
    storage: &'a S,
    codes: CountingAuthorizeTokenGenerator,
    tokens: CountingAccessTokenGenerator,
}

impl<'a, S: OAuthStorage> Engine<'a, S> {
    fn new(storage: &'a S) -> Self {
        Self {
            storage,
            codes: CountingAuthorizeTokenGenerator::new(),
            tokens: CountingAccessTokenGenerator::new(),
        }
    }

    async fn authorize(&self, client_id: &str, state: &str) -> OAuthResult<String> {
        let client = self.storage.get_client(client_id).await?;
        let mut code = AuthorizationCode::builder()
            .client(client)
            .code("")
            .expires_in(250)
            .redirect_uri(SAMPLE_REDIRECT_URI)
            .state(state)
            .build();
        code.code = self.codes.generate_authorize_token(&code);
        self.storage.save_authorize(&code).await?;
        Ok(code.code)
    }

    async fn exchange_code(&self, code: &str, secret: &str) -> OAuthResult<AccessToken> {
        let authorization = self.storage.load_authorize(code).await?;
        assert!(authorization.client.secret_matches(secret), "client authentication");

        let mut token = AccessToken::builder()
            .client(authorization.client.clone())
            .access_token("")
            .expires_in(3600)
            .redirect_uri(authorization.redirect_uri.clone())
            .scope(authorization.scope.clone())
            .authorization(authorization)
            .build();
        let (access, refresh) = self.tokens.generate_access_token(&token, true);
        token.access_token = access;
        token.refresh_token = refresh;

        self.storage.save_access(&token).await?;
        self.storage.remove_authorize(code).await?;
        Ok(token)
    }

    async fn refresh(&self, refresh_token: &str) -> OAuthResult<AccessToken> {
        let previous = self.storage.load_refresh(refresh_token).await?;

        let mut token = AccessToken::builder()
            .client(previous.client.clone())
            .access_token("")
            .expires_in(3600)
            .redirect_uri(previous.redirect_uri.clone())
            .scope(previous.scope.clone())
            .previous(previous.clone())
            .build();
        let (access, refresh) = self.tokens.generate_access_token(&token, true);
        token.access_token = access;
        token.refresh_token = refresh;

        self.storage.save_access(&token).await?;
        self.storage.remove_refresh(refresh_token).await?;
        self.storage.remove_access(&previous.access_token).await?;
        Ok(token)
    }
}

#[tokio::test]
async fn authorization_code_grant() {
    let storage = default_storage().await;
    storage.create_client(&sample_client()).await.expect("register client");
    let engine = Engine::new(&storage);

    let code = engine.authorize("1234", "xyz").await.expect("authorize");
    assert_eq!(code, "1");

    let token = engine.exchange_code(&code, "aabbccdd").await.expect("exchange");
    assert_eq!(token.access_token, "1");
    assert_eq!(token.refresh_token.as_deref(), Some("r1"));

    let loaded = storage.load_access("1").await.expect("access stored");
    assert_eq!(loaded, token);
    let embedded = loaded.authorization.expect("authorization embedded");
    assert_eq!(embedded.state, "xyz");
    assert_eq!(storage.load_refresh("r1").await.expect("refresh stored"), token);

    assert_not_found!(storage.load_authorize("1").await, EntityKind::AuthorizationCode);
    let replay = engine.exchange_code(&code, "aabbccdd").await;
    assert_not_found!(replay, EntityKind::AuthorizationCode);
}

#[tokio::test]
async fn refresh_token_grant() {
    let storage = default_storage().await;
    let original = sample_access(&sample_client());
    storage.save_access(&original).await.expect("seed token");
    let engine = Engine::new(&storage);

    let token = engine.refresh("r9999").await.expect("refresh");
    assert_eq!(token.access_token, "1");
    assert_eq!(token.refresh_token.as_deref(), Some("r1"));
    assert_eq!(token.previous.as_deref(), Some(&original));

    assert_eq!(storage.load_refresh("r1").await.expect("new mirror"), token);
    assert_not_found!(storage.load_access("9999").await, EntityKind::AccessToken);
    assert_not_found!(storage.load_refresh("r9999").await, EntityKind::RefreshToken);

    let reuse = engine.refresh("r9999").await;
    assert_not_found!(reuse, EntityKind::RefreshToken);
}

#[tokio::test]
async fn grant_for_unknown_client_is_not_found() {
    let storage = default_storage().await;
    let engine = Engine::new(&storage);

    assert_not_found!(engine.authorize("nobody", "s").await, EntityKind::Client);
}
