use pagemark::image_search;

#[tokio::test]
async fn test_image_search_renders_markdown_from_results_page() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/search?q=rust+crab")
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body(
            r#"<html><body>
                <img src="data:image/gif;base64,AAAA" />
                <img src="https://img.example.com/crab-1.jpg" />
                <img src="https://img.example.com/crab-2.jpg" />
                <img src="/logos/logo.png" />
            </body></html>"#,
        )
        .create_async()
        .await;

    let base_url = format!("{}/search?q=", server.url());
    let markdown = image_search::search_images_markdown("rust crab", &base_url, 5)
        .await
        .expect("image search succeeds");

    assert_eq!(
        markdown,
        "<img src=\"https://img.example.com/crab-1.jpg\" alt=\"Image\" style=\"max-width:100%; height:auto;\" />\n\n\
         <img src=\"https://img.example.com/crab-2.jpg\" alt=\"Image\" style=\"max-width:100%; height:auto;\" />"
    );

    mock.assert_async().await;
}

#[tokio::test]
async fn test_image_search_propagates_upstream_failure() {
    let mut server = mockito::Server::new_async().await;

    let mock = server
        .mock("GET", "/search?q=kittens")
        .with_status(503)
        .create_async()
        .await;

    let base_url = format!("{}/search?q=", server.url());
    let result = image_search::search_images_markdown("kittens", &base_url, 5).await;

    assert!(result.is_err());
    let err = format!("{:#}", result.unwrap_err());
    assert!(err.contains("503"));

    mock.assert_async().await;
}
