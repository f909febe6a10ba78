use canvas::doc::Shape;
use canvas::reconciler::Ignored;
use canvas::wire::ObjectError;

use super::*;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("canvas-cli").chain(args.iter().copied())).expect("parse")
}

// =============================================================================
// ARGS
// =============================================================================

#[test]
fn defaults_apply_without_flags() {
    let cli = parse(&["dump"]);
    assert!(matches!(cli.command, Command::Dump));
    assert_eq!(cli.board, "default");
    assert!(cli.url.starts_with("ws://"));
}

#[test]
fn draw_rect_with_style() {
    let cli = parse(&["--board", "team", "draw", "rect", "10", "20", "30", "40", "--stroke", "#ff0000", "--fill", "blue"]);
    assert_eq!(cli.board, "team");
    let Command::Draw(draw) = cli.command else {
        panic!("expected draw");
    };
    let obj = build_object(&draw);
    assert_eq!(obj.shape, Shape::Rect { left: 10.0, top: 20.0, width: 30.0, height: 40.0 });
    assert_eq!(obj.style.stroke, "#ff0000");
    assert_eq!(obj.style.fill.as_deref(), Some("blue"));
    assert!(obj.id.is_none());
}

#[test]
fn draw_line_accepts_negative_coordinates() {
    let cli = parse(&["draw", "line", "-5", "0", "5", "-2.5"]);
    let Command::Draw(draw) = cli.command else {
        panic!("expected draw");
    };
    let obj = build_object(&draw);
    assert_eq!(obj.shape, Shape::Line { x1: -5.0, y1: 0.0, x2: 5.0, y2: -2.5 });
    assert!((obj.style.stroke_width - 1.0).abs() < f64::EPSILON);
}

#[test]
fn draw_path_collects_points() {
    let cli = parse(&["draw", "path", "0,0", "10,-5", "20.5,3"]);
    let Command::Draw(draw) = cli.command else {
        panic!("expected draw");
    };
    let obj = build_object(&draw);
    assert_eq!(
        obj.shape,
        Shape::Path { points: vec![Point::new(0.0, 0.0), Point::new(10.0, -5.0), Point::new(20.5, 3.0)] }
    );
}

#[test]
fn draw_path_needs_two_valid_points() {
    assert!(Cli::try_parse_from(["canvas-cli", "draw", "path", "1,1"]).is_err());
    assert!(Cli::try_parse_from(["canvas-cli", "draw", "path", "1,1", "oops"]).is_err());
}

#[test]
fn parse_point_rejects_garbage() {
    assert_eq!(parse_point(" 3 , 4 "), Ok(Point::new(3.0, 4.0)));
    assert!(parse_point("3").is_err());
    assert!(parse_point("a,1").is_err());
}

#[test]
fn move_takes_offsets() {
    let cli = parse(&["move", "abc", "--dx", "-3", "--dy", "4"]);
    let Command::Move { id, dx, dy } = cli.command else {
        panic!("expected move");
    };
    assert_eq!(id, "abc");
    assert!((dx + 3.0).abs() < f64::EPSILON);
    assert!((dy - 4.0).abs() < f64::EPSILON);
}

#[test]
fn remove_requires_id() {
    assert!(Cli::try_parse_from(["canvas-cli", "remove"]).is_err());
}

// =============================================================================
// OUTPUT
// =============================================================================

#[test]
fn describe_reports_changes() {
    assert_eq!(describe(&Applied::Inserted("a".into())).as_deref(), Some("added     a"));
    assert_eq!(describe(&Applied::Cleared).as_deref(), Some("cleared"));
    assert_eq!(
        describe(&Applied::Replaced { count: 3, skipped: 1 }).as_deref(),
        Some("synced    3 objects (1 skipped)")
    );
}

#[test]
fn describe_skips_passthrough() {
    assert_eq!(describe(&Applied::Passthrough), None);
}

#[test]
fn describe_mentions_ignored_and_dropped() {
    let ignored = describe(&Applied::Ignored(Ignored::DuplicateAdd("a".into()))).unwrap_or_default();
    assert!(ignored.contains("DuplicateAdd"));
    let dropped = describe(&Applied::Dropped(ObjectError::MalformedObject { kind: "rect".into(), field: "width" })).unwrap_or_default();
    assert!(dropped.starts_with("dropped"));
}
