mod common;

use axum::http::StatusCode;
use common::{
    DEMO_PASSWORD, DEMO_PHONE, file_state, get, login, register, request, send, test_app,
};
use moviehub::router;
use serde_json::{Value, json};

fn titles(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["title"].as_str().unwrap().to_string())
        .collect()
}

fn ids(body: &Value) -> Vec<i64> {
    body["data"].as_array().unwrap().iter().map(|m| m["id"].as_i64().unwrap()).collect()
}

#[tokio::test]
async fn health_reports_database() {
    let app = test_app().await;
    let (status, body) = get(&app, "/api/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "服务器运行正常");
    assert_eq!(body["data"]["database"], "ok");
    assert!(body["data"]["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn register_then_duplicate_then_login() {
    let app = test_app().await;
    let creds = json!({ "phone": "13800000001", "password": "Aa123456" });

    let (status, body) =
        send(&app, request("POST", "/api/users/register", None, Some(creds.clone()))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "注册成功");
    assert_eq!(body["data"]["user"]["phone"], "13800000001");
    assert_eq!(body["data"]["user"]["nickname"], "用户");
    assert!(body["data"]["user"].get("password").is_none());
    assert!(!body["data"]["token"].as_str().unwrap().is_empty());

    let (status, body) =
        send(&app, request("POST", "/api/users/register", None, Some(creds.clone()))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "该手机号已注册");

    let wrong = json!({ "phone": "13800000001", "password": "nope" });
    let (status, body) = send(&app, request("POST", "/api/users/login", None, Some(wrong))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "密码错误");
    assert!(body.get("data").is_none());

    let (status, body) = send(&app, request("POST", "/api/users/login", None, Some(creds))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "登录成功");
    assert!(body["data"]["expires_at"].as_i64().unwrap() > 0);
}

#[tokio::test]
async fn login_rejects_unknown_phone_and_missing_fields() {
    let app = test_app().await;

    let unknown = json!({ "phone": "19900000000", "password": "Aa123456" });
    let (status, body) = send(&app, request("POST", "/api/users/login", None, Some(unknown))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "该手机号未注册");

    let missing = json!({ "phone": "13800000002" });
    let (status, body) =
        send(&app, request("POST", "/api/users/register", None, Some(missing))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "手机号和密码不能为空");
}

#[tokio::test]
async fn malformed_json_gets_an_envelope() {
    let app = test_app().await;
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/api/users/login")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn profile_hides_password() {
    let app = test_app().await;
    let (user_id, _) = login(&app, DEMO_PHONE, DEMO_PASSWORD).await;

    let (status, body) = get(&app, &format!("/api/users/{user_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["phone"], DEMO_PHONE);
    assert!(body["data"].get("password").is_none());

    let (status, body) = get(&app, "/api/users/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "用户不存在");
}

#[tokio::test]
async fn profile_update_edits_nickname_and_avatar() {
    let app = test_app().await;
    let (user_id, token) = login(&app, DEMO_PHONE, DEMO_PASSWORD).await;
    let uri = format!("/api/users/{user_id}");

    let update = json!({ "nickname": "  影迷  ", "avatar": "/avatars/1.png", "phone": "1" });
    let (status, body) = send(&app, request("PUT", &uri, Some(&token), Some(update))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "更新成功");
    assert_eq!(body["data"]["nickname"], "影迷");
    assert_eq!(body["data"]["avatar"], "/avatars/1.png");
    assert_eq!(body["data"]["phone"], DEMO_PHONE);

    // Absent fields are kept; an empty avatar clears it.
    let (_, body) =
        send(&app, request("PUT", &uri, Some(&token), Some(json!({ "avatar": "" })))).await;
    assert_eq!(body["data"]["nickname"], "影迷");
    assert!(body["data"]["avatar"].is_null());

    let (_, body) = get(&app, &uri).await;
    assert_eq!(body["data"]["nickname"], "影迷");

    let (status, body) =
        send(&app, request("PUT", &uri, Some(&token), Some(json!({ "nickname": " " })))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "昵称不能为空");
}

#[tokio::test]
async fn profile_update_requires_own_token() {
    let app = test_app().await;
    let (demo_id, _) = login(&app, DEMO_PHONE, DEMO_PASSWORD).await;
    let (_, other_token) = register(&app, "13800000004").await;
    let uri = format!("/api/users/{demo_id}");
    let update = json!({ "nickname": "改名" });

    let (status, _) = send(&app, request("PUT", &uri, None, Some(update.clone()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, request("PUT", &uri, Some(&other_token), Some(update))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = get(&app, &uri).await;
    assert_ne!(body["data"]["nickname"], "改名");
}

#[tokio::test]
async fn toggling_twice_restores_favorites() {
    let app = test_app().await;
    let (user_id, token) = login(&app, DEMO_PHONE, DEMO_PASSWORD).await;
    let uri = format!("/api/users/{user_id}/favorites");

    let (_, before) = get(&app, &uri).await;
    assert_eq!(ids(&before), vec![1]);

    let (status, body) =
        send(&app, request("POST", &uri, Some(&token), Some(json!({ "movieId": 2 })))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isFavorite"], true);
    assert_eq!(body["message"], "收藏成功");

    let (_, during) = get(&app, &uri).await;
    assert_eq!(ids(&during), vec![2, 1]);

    let (status, body) =
        send(&app, request("POST", &uri, Some(&token), Some(json!({ "movieId": "2" })))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isFavorite"], false);
    assert_eq!(body["message"], "取消收藏成功");

    let (_, after) = get(&app, &uri).await;
    assert_eq!(ids(&after), ids(&before));
}

#[tokio::test]
async fn concurrent_toggles_settle_consistently() {
    let app = test_app().await;
    let (user_id, token) = login(&app, DEMO_PHONE, DEMO_PASSWORD).await;
    let uri = format!("/api/users/{user_id}/favorites");
    let toggle = || send(&app, request("POST", &uri, Some(&token), Some(json!({ "movieId": 4 }))));

    let ((status_a, a), (status_b, b)) = futures::future::join(toggle(), toggle()).await;
    assert_eq!(status_a, StatusCode::OK);
    assert_eq!(status_b, StatusCode::OK);

    let mut states = vec![a["data"]["isFavorite"].as_bool(), b["data"]["isFavorite"].as_bool()];
    states.sort();
    assert_eq!(states, vec![Some(false), Some(true)]);

    let (_, favorites) = get(&app, &uri).await;
    assert_eq!(ids(&favorites), vec![1]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn parallel_toggles_on_pooled_file_database_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let app = router(file_state(dir.path(), 8).await);
    let (user_id, token) = login(&app, DEMO_PHONE, DEMO_PASSWORD).await;
    let uri = format!("/api/users/{user_id}/favorites");

    let toggles = (0..8).map(|_| {
        let app = app.clone();
        let req = request("POST", &uri, Some(&token), Some(json!({ "movieId": 4 })));
        tokio::spawn(async move { send(&app, req).await })
    });
    let results = futures::future::join_all(toggles).await;

    let mut favorited = 0;
    for result in results {
        let (status, body) = result.unwrap();
        assert_eq!(status, StatusCode::OK, "{body}");
        if body["data"]["isFavorite"] == true {
            favorited += 1;
        }
    }
    // Serialized toggles alternate, so an even count ends where it started.
    assert_eq!(favorited, 4);

    let (_, favorites) = get(&app, &uri).await;
    assert_eq!(ids(&favorites), vec![1]);
}

#[tokio::test]
async fn toggle_validates_input() {
    let app = test_app().await;
    let (user_id, token) = login(&app, DEMO_PHONE, DEMO_PASSWORD).await;
    let uri = format!("/api/users/{user_id}/favorites");

    let (status, body) =
        send(&app, request("POST", &uri, Some(&token), Some(json!({ "movieId": "abc" })))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "电影ID不能为空");

    let (status, body) =
        send(&app, request("POST", &uri, Some(&token), Some(json!({ "movieId": 999 })))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "电影不存在");
}

#[tokio::test]
async fn mutations_require_matching_token() {
    let app = test_app().await;
    let (demo_id, _) = login(&app, DEMO_PHONE, DEMO_PASSWORD).await;
    let (_, other_token) = register(&app, "13800000003").await;
    let uri = format!("/api/users/{demo_id}/favorites");
    let body = json!({ "movieId": 2 });

    let (status, resp) = send(&app, request("POST", &uri, None, Some(body.clone()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(resp["message"], "请先登录");

    let (status, _) =
        send(&app, request("POST", &uri, Some("token_1_1700000000"), Some(body.clone()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, resp) = send(&app, request("POST", &uri, Some(&other_token), Some(body))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(resp["success"], false);

    let (_, favorites) = get(&app, &uri).await;
    assert_eq!(ids(&favorites), vec![1]);
}

#[tokio::test]
async fn empty_search_returns_empty_list() {
    let app = test_app().await;
    for uri in ["/api/movies/search", "/api/movies/search?q=", "/api/movies/search?q=%20%20"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["data"], json!([]), "{uri}");
    }
}

#[tokio::test]
async fn like_wildcards_in_keyword_match_literally() {
    let app = test_app().await;
    for uri in ["/api/movies/search?q=_", "/api/movies/search?q=%25", "/api/movies/search?q=%5C"] {
        let (status, body) = get(&app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(body["data"], json!([]), "{uri}");
    }
}

#[tokio::test]
async fn search_results_match_keyword_and_rank_title_first() {
    let app = test_app().await;
    let (_, all) = get(&app, "/api/movies").await;
    let all_ids = ids(&all);

    let uri = format!("/api/movies/search?q={}", urlencoding::encode("流浪"));
    let (status, body) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body), vec!["流浪地球2", "流浪地球"]);
    assert!(ids(&body).iter().all(|id| all_ids.contains(id)));

    // "郭帆" only appears as a director.
    let uri = format!("/api/movies/search?q={}", urlencoding::encode("郭帆"));
    let (_, body) = get(&app, &uri).await;
    assert_eq!(titles(&body), vec!["流浪地球2", "流浪地球"]);

    // Double-encoded keywords are decoded once more.
    let twice = urlencoding::encode(&urlencoding::encode("战狼")).into_owned();
    let (_, body) = get(&app, &format!("/api/movies/search?q={twice}")).await;
    assert_eq!(titles(&body), vec!["战狼2"]);
}

#[tokio::test]
async fn movie_list_includes_actor_names() {
    let app = test_app().await;
    let (status, body) = get(&app, "/api/movies").await;
    assert_eq!(status, StatusCode::OK);
    let movies = body["data"].as_array().unwrap();
    assert_eq!(movies.len(), 7);
    assert_eq!(movies[0]["title"], "流浪地球2");
    assert_eq!(movies[0]["type"], "科幻/冒险");
    assert_eq!(movies[0]["actors"], json!(["吴京", "刘德华"]));
}

#[tokio::test]
async fn movie_detail_caps_cast_works() {
    let app = test_app().await;

    let (status, body) = get(&app, "/api/movies/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "电影不存在");

    let (status, body) = get(&app, "/api/movies/1").await;
    assert_eq!(status, StatusCode::OK);
    let cast = body["data"]["cast"].as_array().unwrap();
    assert_eq!(cast.len(), 2);

    for member in cast {
        let works = member["works"].as_array().unwrap();
        assert!(works.len() <= 5);
        let scores: Vec<f64> = works.iter().map(|w| w["score"].as_f64().unwrap()).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]), "{scores:?}");
    }

    let wu = cast.iter().find(|m| m["name"] == "吴京").unwrap();
    let works = wu["works"].as_array().unwrap();
    assert_eq!(works.len(), 5);
    assert_eq!(works[0]["title"], "流浪地球2");
    assert!(works.iter().all(|w| w["title"] != "攀登者"));
}

#[tokio::test]
async fn literal_movie_routes_are_not_shadowed() {
    let app = test_app().await;

    let (status, body) = get(&app, "/api/movies/hot/list").await;
    assert_eq!(status, StatusCode::OK);
    let hot = body["data"].as_array().unwrap();
    assert_eq!(hot.len(), 7);
    assert_eq!(hot[0]["title"], "流浪地球2");
    assert_eq!(hot[1]["title"], "无间道");

    let (status, body) = get(&app, "/api/movies/new/list").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body)[..2], ["流浪地球2".to_string(), "满江红".to_string()]);

    let (status, body) = get(&app, "/api/movies/1/clips").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&body), vec!["官方预告", "幕后花絮"]);

    let (status, body) = get(&app, "/api/movies/proxy/video").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "缺少视频URL参数");

    let (status, body) = get(&app, "/api/movies/search?q=x").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].is_array());

    let (status, body) = get(&app, "/api/movies/abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn carousel_lists_active_slides_in_order() {
    let app = test_app().await;
    let (status, body) = get(&app, "/api/carousel").await;
    assert_eq!(status, StatusCode::OK);
    let slides = body["data"].as_array().unwrap();
    assert_eq!(slides.len(), 3);
    let orders: Vec<i64> = slides.iter().map(|s| s["sort_order"].as_i64().unwrap()).collect();
    assert_eq!(orders, vec![0, 1, 2]);
    assert_eq!(slides[0]["title"], "流浪地球2");
}

#[tokio::test]
async fn comments_are_added_and_listed_newest_first() {
    let app = test_app().await;
    let (user_id, token) = login(&app, DEMO_PHONE, DEMO_PASSWORD).await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/comments/movies/2",
            Some(&token),
            Some(json!({ "userId": user_id, "content": "  好看  " })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "评论成功");
    assert_eq!(body["data"]["content"], "好看");
    assert_eq!(body["data"]["username"], "电影爱好者");

    let (status, body) = send(
        &app,
        request(
            "POST",
            &format!("/api/users/{user_id}/comments"),
            Some(&token),
            Some(json!({ "movieId": 3, "content": "经典" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["movie_id"], 3);

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/comments/movies/2",
            Some(&token),
            Some(json!({ "userId": user_id, "content": "   " })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "用户ID和评论内容不能为空");

    let (_, body) = get(&app, &format!("/api/users/{user_id}/comments")).await;
    let mine = body["data"].as_array().unwrap();
    assert_eq!(mine.len(), 3);
    assert_eq!(mine[0]["movieTitle"], "流浪地球");
    assert_eq!(mine[1]["movieTitle"], "满江红");

    let (_, body) = get(&app, "/api/comments/movies/2").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn only_the_author_can_delete_a_comment() {
    let app = test_app().await;
    let (demo_id, demo_token) = login(&app, DEMO_PHONE, DEMO_PASSWORD).await;
    let (other_id, other_token) = register(&app, "13800000004").await;

    let (_, body) = get(&app, "/api/comments/movies/1").await;
    let comment_id = body["data"][0]["id"].as_i64().unwrap();

    // Addressing the comment through the other user's own path.
    let (status, body) = send(
        &app,
        request(
            "DELETE",
            &format!("/api/users/{other_id}/comments/{comment_id}"),
            Some(&other_token),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "无权删除此评论或评论不存在");

    // Addressing it through the author's path with the wrong token.
    let owner_uri = format!("/api/users/{demo_id}/comments/{comment_id}");
    let (status, _) = send(&app, request("DELETE", &owner_uri, Some(&other_token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = get(&app, "/api/comments/movies/1").await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, request("DELETE", &owner_uri, Some(&demo_token), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "删除成功");

    let (_, body) = get(&app, "/api/comments/movies/1").await;
    assert_eq!(body["data"], json!([]));

    let (status, _) = send(&app, request("DELETE", &owner_uri, Some(&demo_token), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_api_route_is_404_envelope() {
    let app = test_app().await;
    let (status, body) = get(&app, "/api/nothing/here").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}
