//! End-to-end tests for epigraphs.

mod common;

use common::{TestClient, TestServer};
use reqwest::StatusCode;

#[tokio::test]
async fn epigraph_lifecycle() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let book_id = client.add_book("Berg").await;
    let person_id = client.add_person("Ann Quin").await;

    let epigraph_id = client
        .add_epigraph(book_id, person_id, "A man called Berg...")
        .await;

    let epigraphs = client.get_json("/epigraphs").await;
    let epigraphs = epigraphs.as_array().unwrap();
    assert_eq!(epigraphs.len(), 1);
    assert_eq!(epigraphs[0]["book_title"], "Berg");
    assert_eq!(epigraphs[0]["author_name"], "Ann Quin");
    assert_eq!(epigraphs[0]["quote"], "A man called Berg...");

    let response = client
        .post_form(
            &format!("/epigraphs/edit/{}", epigraph_id),
            &[
                ("book_id", &book_id.to_string()),
                ("author_id", &person_id.to_string()),
                ("quote", "A man called Berg, who changed his name to Greb..."),
                ("notes", "opening line"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let form = client
        .get_json(&format!("/epigraphs/edit/{}", epigraph_id))
        .await;
    assert!(form["epigraph"]["quote"]
        .as_str()
        .unwrap()
        .contains("Greb"));
    assert_eq!(form["epigraph"]["notes"], "opening line");

    let response = client
        .post_form(&format!("/epigraphs/delete/{}", epigraph_id), &[])
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(client
        .get_json("/epigraphs")
        .await
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn epigraph_requires_author_and_quote() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let book_id = client.add_book("Berg").await;
    let person_id = client.add_person("Ann Quin").await;

    let missing_author = client
        .post_form(
            "/epigraphs/add",
            &[("book_id", &book_id.to_string()), ("quote", "Quote")],
        )
        .await;
    assert_eq!(missing_author.status(), StatusCode::BAD_REQUEST);

    let blank_quote = client
        .post_form(
            "/epigraphs/add",
            &[
                ("book_id", &book_id.to_string()),
                ("author_id", &person_id.to_string()),
                ("quote", "   "),
            ],
        )
        .await;
    assert_eq!(blank_quote.status(), StatusCode::BAD_REQUEST);

    assert!(client
        .get_json("/epigraphs")
        .await
        .as_array()
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn epigraph_selection_list_respects_the_complete_flag() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let finished = client
        .add_book_with(&[("title", "Finished"), ("is_complete", "on")])
        .await;
    let open_book = client.add_book("Open").await;
    let person_id = client.add_person("Ann Quin").await;

    let form = client.get_json("/epigraphs/add").await;
    let offered: Vec<i64> = form["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_i64().unwrap())
        .collect();
    assert_eq!(offered, vec![open_book]);

    let epigraph_id = client.add_epigraph(finished, person_id, "Quote").await;
    let form = client
        .get_json(&format!("/epigraphs/edit/{}", epigraph_id))
        .await;
    let offered: Vec<i64> = form["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_i64().unwrap())
        .collect();
    assert_eq!(offered.len(), 2);
}

#[tokio::test]
async fn deleting_an_unknown_epigraph_is_not_found() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.post_form("/epigraphs/delete/999", &[]).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
