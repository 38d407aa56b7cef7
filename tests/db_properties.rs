//! End-to-end behaviour against Postgres: accounts, deck ownership, and games
//! read back through the API and the stat sheets.

mod common;

use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{http::StatusCode, test, web, App};
use commander_tracker_server::db::player_repo::{self, AccountUpdate, NewPlayer, ProfileChanges};
use commander_tracker_server::http::routes;
use serde_json::{json, Value};
use sqlx::PgPool;
use uuid::Uuid;

macro_rules! app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($pool.clone()))
                .configure(routes::init_routes)
                .default_service(web::to(routes::not_found)),
        )
        .await
    };
}

async fn call<S, R, B>(app: &S, req: R) -> (StatusCode, Value)
where
    S: Service<R, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(app, req).await;
    let status = res.status();
    let body = test::read_body(res).await;
    (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
}

fn id_of(body: &Value) -> Uuid {
    body["data"]["id"].as_str().unwrap().parse().unwrap()
}

fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}

fn register_req(nickname: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(json!({
            "name": nickname,
            "nickname": nickname,
            "email": format!("{}@example.com", nickname.to_lowercase()),
            "password": "correct-horse",
        }))
}

/// Registers a player and returns its id and token.
macro_rules! register {
    ($app:expr, $nickname:expr) => {{
        let (status, body) = call(&$app, register_req($nickname).to_request()).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        (id_of(&body), body["token"].as_str().unwrap().to_string())
    }};
}

#[actix_rt::test]
async fn claimed_guest_keeps_identity_decks_and_games() {
    let Some(db) = common::test_db().await else { return };
    let app = app!(db.pool);

    let (alice, token) = register!(app, "Alice");

    let req = test::TestRequest::post()
        .uri("/api/players/guest")
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "Bob", "nickname": "Bob" }))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::CREATED);
    let bob = id_of(&body);

    let mut decks = Vec::new();
    for (owner, name) in [(Some(bob), "Bob's Atraxa"), (None, "Alice's Edgar")] {
        let req = test::TestRequest::post()
            .uri("/api/decks")
            .insert_header(bearer(&token))
            .set_json(json!({ "owner": owner, "name": name, "commander": name }))
            .to_request();
        let (status, body) = call(&app, req).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        decks.push(id_of(&body));
    }

    let req = test::TestRequest::post()
        .uri("/api/games")
        .insert_header(bearer(&token))
        .set_json(json!({ "participants": [
            { "playerId": alice, "deckId": decks[1], "placement": 1 },
            { "playerId": bob, "deckId": decks[0], "placement": 2, "eliminatedBy": alice },
        ]}))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let game = id_of(&body);

    let (claimed, _) = register!(app, "bob");
    assert_eq!(claimed, bob);

    let req = test::TestRequest::get()
        .uri(&format!("/api/players/{bob}"))
        .to_request();
    let (_, body) = call(&app, req).await;
    assert_eq!(body["data"]["isGuest"], false);
    assert_eq!(body["data"]["isAdmin"], false);
    assert_eq!(body["data"]["decks"], json!([decks[0]]));

    let req = test::TestRequest::get()
        .uri(&format!("/api/games?player={bob}"))
        .to_request();
    let (_, body) = call(&app, req).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["id"], json!(game));

    db.cleanup().await;
}

#[actix_rt::test]
async fn last_admin_stays_an_admin() {
    let Some(db) = common::test_db().await else { return };
    let app = app!(db.pool);

    let (alice, token) = register!(app, "Alice");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/players/{alice}"))
        .insert_header(bearer(&token))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "cannot delete the last admin");

    let req = test::TestRequest::put()
        .uri(&format!("/api/players/{alice}"))
        .insert_header(bearer(&token))
        .set_json(json!({ "isAdmin": false, "name": "Alice A." }))
        .to_request();
    let (status, _) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri(&format!("/api/players/{alice}"))
        .to_request();
    let (_, body) = call(&app, req).await;
    assert_eq!(body["data"]["isAdmin"], true);
    assert_eq!(body["data"]["name"], "Alice");

    db.cleanup().await;
}

fn account(nickname: &str) -> NewPlayer<'_> {
    NewPlayer {
        name: nickname,
        nickname,
        email: Some(nickname),
        password_hash: Some("not-a-real-hash"),
        profile_image: None,
        is_guest: false,
    }
}

async fn is_admin(pool: &PgPool, id: Uuid) -> bool {
    player_repo::find_by_id(pool, id).await.unwrap().unwrap().is_admin
}

#[actix_rt::test]
async fn admin_change_and_profile_edit_commit_together() {
    let Some(db) = common::test_db().await else { return };
    let pool = &db.pool;

    let alice = player_repo::insert(pool, &account("alice")).await.unwrap();
    let carol = player_repo::insert(pool, &account("carol")).await.unwrap();
    assert!(alice.is_admin && !carol.is_admin);

    let none = ProfileChanges::default();
    let demote = player_repo::update_account(pool, alice.id, &none, Some(false))
        .await
        .unwrap();
    assert!(matches!(demote, AccountUpdate::LastAdmin));

    let promote = player_repo::update_account(pool, carol.id, &none, Some(true))
        .await
        .unwrap();
    assert!(matches!(promote, AccountUpdate::Updated(p) if p.is_admin));

    // demotion is undone when the nickname in the same edit is taken
    let taken = ProfileChanges {
        nickname: Some("ALICE"),
        ..Default::default()
    };
    assert!(player_repo::update_account(pool, carol.id, &taken, Some(false))
        .await
        .is_err());
    assert!(is_admin(pool, carol.id).await);

    let missing = player_repo::update_account(pool, Uuid::new_v4(), &none, None)
        .await
        .unwrap();
    assert!(matches!(missing, AccountUpdate::NotFound));

    db.cleanup().await;
}

#[actix_rt::test]
async fn nickname_taken_by_another_player_is_refused() {
    let Some(db) = common::test_db().await else { return };
    let app = app!(db.pool);

    let (_, token) = register!(app, "Alice");
    let req = test::TestRequest::post()
        .uri("/api/players/guest")
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "Bob", "nickname": "Bob" }))
        .to_request();
    assert_eq!(call(&app, req).await.0, StatusCode::CREATED);

    let req = test::TestRequest::put()
        .uri("/api/auth/me")
        .insert_header(bearer(&token))
        .set_json(json!({ "nickname": "bob" }))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "nickname");

    // re-casing your own nickname is fine
    let req = test::TestRequest::put()
        .uri("/api/auth/me")
        .insert_header(bearer(&token))
        .set_json(json!({ "nickname": "ALICE" }))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["nickname"], "ALICE");

    db.cleanup().await;
}

#[actix_rt::test]
async fn deleted_decks_leave_the_owner_and_old_games_stay_editable() {
    let Some(db) = common::test_db().await else { return };
    let app = app!(db.pool);

    let (alice, token) = register!(app, "Alice");
    let req = test::TestRequest::post()
        .uri("/api/players/guest")
        .insert_header(bearer(&token))
        .set_json(json!({ "name": "Bob", "nickname": "Bob" }))
        .to_request();
    let bob = id_of(&call(&app, req).await.1);

    let mut decks = Vec::new();
    for name in ["Edgar", "Meren"] {
        let req = test::TestRequest::post()
            .uri("/api/decks")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": name, "commander": name, "colors": ["B"] }))
            .to_request();
        decks.push(id_of(&call(&app, req).await.1));
    }
    let req = test::TestRequest::post()
        .uri("/api/decks")
        .insert_header(bearer(&token))
        .set_json(json!({ "owner": bob, "name": "Atraxa", "commander": "Atraxa" }))
        .to_request();
    let bob_deck = id_of(&call(&app, req).await.1);

    let seats = json!([
        { "playerId": alice, "deckId": decks[0], "placement": 1 },
        { "playerId": bob, "deckId": bob_deck, "placement": 2 },
    ]);
    let req = test::TestRequest::post()
        .uri("/api/games")
        .insert_header(bearer(&token))
        .set_json(json!({ "participants": seats }))
        .to_request();
    let game = id_of(&call(&app, req).await.1);

    for deck in [decks[0], bob_deck] {
        let req = test::TestRequest::delete()
            .uri(&format!("/api/decks/{deck}"))
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(call(&app, req).await.0, StatusCode::OK);
    }

    let req = test::TestRequest::get()
        .uri(&format!("/api/players/{alice}"))
        .to_request();
    let (_, body) = call(&app, req).await;
    assert_eq!(body["data"]["decks"], json!([decks[1]]));

    let req = test::TestRequest::put()
        .uri(&format!("/api/games/{game}"))
        .insert_header(bearer(&token))
        .set_json(json!({ "notes": "rematch pending", "participants": seats }))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["notes"], "rematch pending");
    assert_eq!(body["data"]["participants"][1]["deckName"], Value::Null);

    // a deleted deck cannot be picked for a different seat
    let req = test::TestRequest::put()
        .uri(&format!("/api/games/{game}"))
        .insert_header(bearer(&token))
        .set_json(json!({ "participants": [
            { "playerId": alice, "deckId": bob_deck, "placement": 1 },
            { "playerId": bob, "deckId": decks[0], "placement": 2 },
        ]}))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["field"], "participants[0].deckId");

    db.cleanup().await;
}

#[actix_rt::test]
async fn four_player_game_matches_the_stat_sheets() {
    let Some(db) = common::test_db().await else { return };
    let app = app!(db.pool);

    let (alice, token) = register!(app, "Alice");
    let mut players = vec![alice];
    for nick in ["Bob", "Cleo", "Dan"] {
        let req = test::TestRequest::post()
            .uri("/api/players/guest")
            .insert_header(bearer(&token))
            .set_json(json!({ "name": nick, "nickname": nick }))
            .to_request();
        players.push(id_of(&call(&app, req).await.1));
    }
    let mut decks = Vec::new();
    for (i, owner) in players.iter().enumerate() {
        let req = test::TestRequest::post()
            .uri("/api/decks")
            .insert_header(bearer(&token))
            .set_json(json!({ "owner": owner, "name": format!("deck {i}"), "commander": "Kenrith" }))
            .to_request();
        decks.push(id_of(&call(&app, req).await.1));
    }

    // sent out of order; Dan falls to Cleo, Cleo to Bob, Bob to Alice
    let req = test::TestRequest::post()
        .uri("/api/games")
        .insert_header(bearer(&token))
        .set_json(json!({ "duration": 95, "participants": [
            { "playerId": players[3], "deckId": decks[3], "placement": 4, "eliminatedBy": players[2] },
            { "playerId": players[1], "deckId": decks[1], "placement": 2, "eliminatedBy": players[0] },
            { "playerId": players[0], "deckId": decks[0], "placement": 1 },
            { "playerId": players[2], "deckId": decks[2], "placement": 3, "eliminatedBy": players[1] },
        ]}))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let game = id_of(&body);

    let req = test::TestRequest::get()
        .uri(&format!("/api/games/{game}"))
        .to_request();
    let (_, body) = call(&app, req).await;
    let seats = body["data"]["participants"].as_array().unwrap();
    assert_eq!(seats.len(), 4);
    for (i, seat) in seats.iter().enumerate() {
        assert_eq!(seat["placement"], i + 1);
        assert_eq!(seat["playerId"], json!(players[i]));
        assert_eq!(seat["deckId"], json!(decks[i]));
        assert_eq!(seat["deckName"], format!("deck {i}"));
    }
    assert_eq!(seats[1]["nickname"], "Bob");
    assert_eq!(seats[1]["eliminatedBy"], json!(players[0]));
    assert_eq!(body["data"]["duration"], 95);

    let req = test::TestRequest::get()
        .uri(&format!("/api/stats/player/{}", players[1]))
        .to_request();
    let (status, body) = call(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject"]["id"], json!(players[1]));
    let stats = &body["stats"];
    assert_eq!(stats["games"], 1);
    assert_eq!(stats["wins"], 0);
    assert_eq!(stats["averagePlacement"], 2.0);
    assert_eq!(stats["eliminations"], 1);
    assert_eq!(stats["timesEliminated"], 1);
    assert_eq!(stats["decks"][0]["id"], json!(decks[1]));

    let req = test::TestRequest::get()
        .uri(&format!("/api/stats/player/{alice}"))
        .to_request();
    let (_, body) = call(&app, req).await;
    assert_eq!(body["stats"]["wins"], 1);
    assert_eq!(body["stats"]["winRate"], 100.0);

    db.cleanup().await;
}
