use super::*;

#[test]
fn board_state_new_is_empty() {
    let bs = BoardState::new();
    assert!(bs.objects.is_empty());
    assert!(bs.clients.is_empty());
}

#[tokio::test]
async fn app_state_clones_share_boards() {
    let state = test_helpers::test_app_state();
    let clone = state.clone();
    test_helpers::seed_board(&state, "b", vec![test_helpers::dummy_object("x")]).await;
    let boards = clone.boards.read().await;
    assert_eq!(boards.get("b").map(|b| b.objects.len()), Some(1));
}

#[tokio::test]
async fn attach_client_creates_board() {
    let state = test_helpers::test_app_state();
    let (client_id, _rx) = test_helpers::attach_client(&state, "fresh").await;
    let boards = state.boards.read().await;
    assert!(boards.get("fresh").is_some_and(|b| b.clients.contains_key(&client_id)));
}
