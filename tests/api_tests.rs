use axum::http::StatusCode;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

use common::{
    admin_token, body_json, empty_request, json_request, setup_test_app, ADMIN_PASSWORD,
};

async fn add_route(app: &axum::Router, token: &str, body: Value) -> Value {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/routes", &body, Some(token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

async fn add_bus(app: &axum::Router, token: &str, route_id: i64, seats: i32, fare: f64) -> Value {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/buses",
            &json!({
                "route_id": route_id,
                "operator": "Rajdhani Travels",
                "total_seats": seats,
                "fare": fare
            }),
            Some(token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await
}

#[tokio::test]
async fn test_health_check_endpoint() {
    let app = setup_test_app().await;

    let response = app
        .oneshot(empty_request("GET", "/debug/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["checks"]["database"]["backend"], "sqlite");
    assert_eq!(json["checks"]["cache"]["backend"], "memory");
    assert_eq!(json["checks"]["geocoding"], "disabled");
}

#[tokio::test]
async fn test_admin_login_rejects_wrong_password() {
    let app = setup_test_app().await;

    for body in [
        json!({ "password": "wrong" }),
        json!({ "password": "" }),
        json!({}),
        json!({ "origin": "Delhi", "distance_km": -5 }),
        json!({ "password": 12345 }),
        json!({ "password": null }),
        json!({ "password": ["x"] }),
        json!("let-me-in"),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/admin/login", &body, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{body}");
    }

    let not_json = axum::http::Request::builder()
        .method("POST")
        .uri("/admin/login")
        .header(axum::http::header::CONTENT_TYPE, "text/plain")
        .body(axum::body::Body::from("password=let-me-in"))
        .unwrap();
    let response = app.clone().oneshot(not_json).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Surrounding whitespace is not part of the password
    let response = app
        .oneshot(json_request(
            "POST",
            "/admin/login",
            &json!({ "password": format!("  {ADMIN_PASSWORD}\n") }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_admin_endpoints_require_token() {
    let app = setup_test_app().await;
    let route = json!({ "origin": "Delhi", "destination": "Agra", "distance_km": 233 });

    let response = app
        .clone()
        .oneshot(json_request("POST", "/routes", &route, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(json_request("POST", "/routes", &route, Some("not.a.token")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Token is checked before the body is looked at
    let response = app
        .clone()
        .oneshot(json_request("POST", "/buses", &json!({ "junk": true }), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    for uri in ["/bookings", "/users"] {
        let response = app
            .clone()
            .oneshot(empty_request("GET", uri, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn test_add_route_validation() {
    let app = setup_test_app().await;
    let token = admin_token(&app).await;

    for body in [
        json!({ "origin": "Delhi", "destination": "Agra", "distance_km": 0 }),
        json!({ "origin": "Delhi", "destination": "Agra", "distance_km": -10 }),
        json!({ "origin": "", "destination": "Agra", "distance_km": 233 }),
        json!({ "origin": "Delhi", "distance_km": 233 }),
    ] {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/routes", &body, Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
    }

    let response = app
        .oneshot(empty_request("GET", "/routes", None))
        .await
        .unwrap();
    assert_eq!(body_json(response).await, json!([]));
}

#[tokio::test]
async fn test_add_list_search_and_delete_routes() {
    let app = setup_test_app().await;
    let token = admin_token(&app).await;

    let created = add_route(
        &app,
        &token,
        json!({
            "from": "  Delhi ",
            "to": "Agra",
            "distance": 233,
            "ticket_price": 120,
            "coords": [{"lat": 28.6139, "lng": 77.209}, {"lat": 27.1767, "lng": 78.0081}]
        }),
    )
    .await;
    assert_eq!(created["origin"], "Delhi");
    assert_eq!(created["distance_km"], 233.0);
    assert_eq!(created["coords"].as_array().unwrap().len(), 2);

    add_route(
        &app,
        &token,
        json!({ "origin": "Mumbai", "destination": "Pune", "distance_km": 148 }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/routes", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let routes = body_json(response).await;
    assert_eq!(routes.as_array().unwrap().len(), 2);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/routes/search?origin=delhi", None))
        .await
        .unwrap();
    let found = body_json(response).await;
    assert_eq!(found.as_array().unwrap().len(), 1);
    assert_eq!(found[0]["destination"], "Agra");

    let id = created["id"].as_i64().unwrap();
    let response = app
        .clone()
        .oneshot(empty_request("DELETE", &format!("/routes/{id}"), Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(empty_request("DELETE", &format!("/routes/{id}"), Some(&token)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_find_route_uses_ticket_prices_or_computed_fare() {
    let app = setup_test_app().await;
    let token = admin_token(&app).await;

    add_route(
        &app,
        &token,
        json!({ "origin": "Delhi", "destination": "Agra", "distance_km": 233, "ticket_price": 120 }),
    )
    .await;
    add_route(
        &app,
        &token,
        json!({ "origin": "Agra", "destination": "Mumbai", "distance_km": 1194, "ticket_price": 600 }),
    )
    .await;
    add_route(
        &app,
        &token,
        json!({ "origin": "Delhi", "destination": "Jaipur", "distance_km": 280 }),
    )
    .await;

    // Every leg priced: the fare is the ticket sum
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/routes/find",
            &json!({ "from": "Delhi", "to": "Mumbai" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let journey = body_json(response).await;
    assert_eq!(journey["path"], json!(["Delhi", "Agra", "Mumbai"]));
    assert_eq!(journey["distance_km"], 1427.0);
    assert_eq!(journey["fare"], 720.0);
    assert_eq!(journey["fare_source"], "ticket_prices");
    assert_eq!(journey["legs"].as_array().unwrap().len(), 2);

    // Unpriced leg, travelled against its stored direction: computed fare
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/routes/find",
            &json!({ "from": "jaipur", "to": "AGRA" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let journey = body_json(response).await;
    assert_eq!(journey["distance_km"], 513.0);
    assert_eq!(journey["fare"], 10.0 + 513.0 * 0.5);
    assert_eq!(journey["fare_source"], "computed");
    assert_eq!(journey["time_hours"], 8.55);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/routes/find",
            &json!({ "from": "Delhi", "to": "Kolkata" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(json_request(
            "POST",
            "/routes/find",
            &json!({ "from": "Delhi" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_fare_quote() {
    let app = setup_test_app().await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/fares/quote",
            &json!({ "distance_km": 120 }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let quote = body_json(response).await;
    assert_eq!(quote["fare"], 70.0);
    assert_eq!(quote["time_hours"], 2.0);

    let response = app
        .oneshot(json_request(
            "POST",
            "/fares/quote",
            &json!({ "distance_km": -1 }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_booking_capacity_and_cancellation() {
    let app = setup_test_app().await;
    let token = admin_token(&app).await;

    let route = add_route(
        &app,
        &token,
        json!({ "origin": "Delhi", "destination": "Agra", "distance_km": 233 }),
    )
    .await;
    let bus = add_bus(&app, &token, route["id"].as_i64().unwrap(), 3, 50.0).await;
    let bus_id = bus["id"].as_i64().unwrap();
    assert_eq!(bus["seats_available"], 3);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/bookings",
            &json!({ "bus_id": bus_id, "passenger_name": "Asha", "seats": 2 }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let booking = body_json(response).await;
    assert_eq!(booking["total_price"], 100.0);
    assert_eq!(booking["status"], "confirmed");

    // Over capacity
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/bookings",
            &json!({ "bus_id": bus_id, "passenger_name": "Ravi", "seats": 2 }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(empty_request(
            "GET",
            &format!("/buses/{bus_id}/availability"),
            None,
        ))
        .await
        .unwrap();
    let availability = body_json(response).await;
    assert_eq!(availability["seats_available"], 1);
    assert_eq!(availability["seats_booked"], 2);

    let booking_id = booking["id"].as_str().unwrap();
    let response = app
        .clone()
        .oneshot(empty_request(
            "POST",
            &format!("/bookings/{booking_id}/cancel"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cancelled = body_json(response).await;
    assert_eq!(cancelled["status"], "cancelled");
    assert!(cancelled["cancelled_at"].is_string());

    let response = app
        .clone()
        .oneshot(empty_request(
            "POST",
            &format!("/bookings/{booking_id}/cancel"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .oneshot(empty_request(
            "GET",
            &format!("/buses/{bus_id}/availability"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["seats_available"], 3);
}

#[tokio::test]
async fn test_seat_numbers_and_seat_map() {
    let app = setup_test_app().await;
    let token = admin_token(&app).await;

    let route = add_route(
        &app,
        &token,
        json!({ "origin": "Jaipur", "destination": "Udaipur", "distance_km": 393 }),
    )
    .await;
    let bus = add_bus(&app, &token, route["id"].as_i64().unwrap(), 4, 60.0).await;
    let bus_id = bus["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/bookings",
            &json!({ "bus_id": bus_id, "passenger_name": "Asha", "seatIDs": [3, 1] }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let booking = body_json(response).await;
    assert_eq!(booking["seats_booked"], 2);
    assert_eq!(booking["seat_numbers"], json!([1, 3]));
    assert_eq!(booking["total_price"], 120.0);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/bookings",
            &json!({ "bus_id": bus_id, "passenger_name": "Ravi", "seat_numbers": [3] }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/bookings",
            &json!({ "bus_id": bus_id, "passenger_name": "Ravi", "seats": 1 }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["seat_numbers"], json!([2]));

    let response = app
        .clone()
        .oneshot(empty_request("GET", &format!("/buses/{bus_id}/seats"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let seats = body_json(response).await;
    assert_eq!(seats["total_seats"], 4);
    assert_eq!(seats["booked"], json!([1, 2, 3]));
    assert_eq!(seats["available"], json!([4]));

    let response = app
        .oneshot(empty_request("GET", "/buses/9999/seats", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_booking_rejections() {
    let app = setup_test_app().await;
    let token = admin_token(&app).await;

    let route = add_route(
        &app,
        &token,
        json!({ "origin": "Mumbai", "destination": "Pune", "distance_km": 148 }),
    )
    .await;
    let bus = add_bus(&app, &token, route["id"].as_i64().unwrap(), 10, 85.0).await;
    let bus_id = bus["id"].as_i64().unwrap();

    let cases = [
        (json!({ "bus_id": 9999, "passenger_name": "Asha", "seats": 1 }), StatusCode::NOT_FOUND),
        (json!({ "bus_id": bus_id, "passenger_name": "Asha", "seats": 0 }), StatusCode::BAD_REQUEST),
        (json!({ "bus_id": bus_id, "passenger_name": " ", "seats": 1 }), StatusCode::BAD_REQUEST),
        (json!({ "bus_id": bus_id, "passenger_name": "Asha", "seat_numbers": [11] }), StatusCode::BAD_REQUEST),
        (json!({ "bus_id": bus_id, "passenger_name": "Asha", "seats": 2, "seat_numbers": [1] }), StatusCode::BAD_REQUEST),
    ];
    for (body, expected) in cases {
        let response = app
            .clone()
            .oneshot(json_request("POST", "/bookings", &body, None))
            .await
            .unwrap();
        assert_eq!(response.status(), expected, "{body}");
    }

    // Deactivated buses take no bookings
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/buses/{bus_id}"),
            &json!({ "is_active": false }),
            Some(&token),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(json_request(
            "POST",
            "/bookings",
            &json!({ "bus_id": bus_id, "passenger_name": "Asha", "seats": 1 }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_bookings_and_ownership() {
    let app = setup_test_app().await;
    let token = admin_token(&app).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/users",
            &json!({ "user_id": "u-42", "name": "Asha", "email": "asha@example.com" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let route = add_route(
        &app,
        &token,
        json!({ "origin": "Bangalore", "destination": "Chennai", "distance_km": 346 }),
    )
    .await;
    let bus = add_bus(&app, &token, route["id"].as_i64().unwrap(), 40, 180.0).await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/bookings",
            &json!({
                "bus_id": bus["id"],
                "passenger_name": "Asha",
                "seats": 1,
                "user_id": "u-42"
            }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let booking = body_json(response).await;
    let booking_id = booking["id"].as_str().unwrap();

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/users/u-42/bookings", None))
        .await
        .unwrap();
    let bookings = body_json(response).await;
    assert_eq!(bookings.as_array().unwrap().len(), 1);
    assert_eq!(bookings[0]["id"], booking["id"]);

    // Someone else's booking looks like no booking at all
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/bookings/{booking_id}/cancel"),
            &json!({ "user_id": "u-7" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/bookings/{booking_id}/cancel"),
            &json!({ "user_id": "u-42" }),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(empty_request("GET", "/users/nobody/bookings", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(empty_request("GET", "/users", Some(&token)))
        .await
        .unwrap();
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);
}
