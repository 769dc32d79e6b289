use super::*;

fn sample_stroke(id: StrokeId) -> Stroke {
    Stroke {
        id,
        red: 10,
        green: 20,
        blue: 30,
        alpha: 0.5,
        width: 4,
        points: vec![Point::new(1.0, 2.0), Point::new(3.5, 4.25)],
    }
}

#[test]
fn provisional_sentinel_is_zero() {
    assert!(sample_stroke(PROVISIONAL_ID).is_provisional());
    assert!(!sample_stroke(7).is_provisional());
}

#[test]
fn validate_committed_accepts_well_formed_stroke() {
    assert_eq!(sample_stroke(7).validate_committed(), Ok(()));
}

#[test]
fn validate_committed_rejects_provisional_id() {
    assert_eq!(sample_stroke(0).validate_committed(), Err(StrokeError::ProvisionalId));
}

#[test]
fn validate_committed_rejects_empty_points() {
    let mut stroke = sample_stroke(3);
    stroke.points.clear();
    assert_eq!(stroke.validate_committed(), Err(StrokeError::EmptyPoints(3)));
}

#[test]
fn validate_committed_rejects_zero_width() {
    let mut stroke = sample_stroke(3);
    stroke.width = 0;
    assert_eq!(stroke.validate_committed(), Err(StrokeError::ZeroWidth(3)));
}

#[test]
fn validate_committed_rejects_alpha_outside_unit_range() {
    let mut stroke = sample_stroke(3);
    stroke.alpha = 1.5;
    assert!(matches!(stroke.validate_committed(), Err(StrokeError::AlphaOutOfRange { id: 3, .. })));
    stroke.alpha = f64::NAN;
    assert!(matches!(stroke.validate_committed(), Err(StrokeError::AlphaOutOfRange { id: 3, .. })));
}

#[test]
fn validate_committed_accepts_single_point_stroke() {
    let mut stroke = sample_stroke(9);
    stroke.points.truncate(1);
    assert_eq!(stroke.validate_committed(), Ok(()));
}

#[test]
fn decode_stroke_reads_wire_field_names() {
    let json = r#"{"id":7,"red":1,"green":2,"blue":3,"alpha":0.7,"width":20,"points":[{"x":10,"y":11.5}]}"#;
    let stroke = decode_stroke(json).expect("stroke should decode");
    assert_eq!(stroke.id, 7);
    assert_eq!((stroke.red, stroke.green, stroke.blue), (1, 2, 3));
    assert_eq!(stroke.width, 20);
    assert_eq!(stroke.points, vec![Point::new(10.0, 11.5)]);
}

#[test]
fn decode_stroke_rejects_malformed_json() {
    let err = decode_stroke("{not json").expect_err("payload should fail");
    assert!(matches!(err, CodecError::Json(_)));
}

#[test]
fn decode_stroke_rejects_channel_out_of_range() {
    let json = r#"{"id":7,"red":300,"green":2,"blue":3,"alpha":0.7,"width":20,"points":[{"x":1,"y":1}]}"#;
    let err = decode_stroke(json).expect_err("red=300 should fail");
    assert!(matches!(err, CodecError::Json(_)));
}

#[test]
fn decode_stroke_rejects_provisional_payload() {
    let json = r#"{"id":0,"red":1,"green":2,"blue":3,"alpha":0.7,"width":20,"points":[{"x":1,"y":1}]}"#;
    let err = decode_stroke(json).expect_err("provisional stroke should fail");
    assert!(matches!(err, CodecError::Invalid(StrokeError::ProvisionalId)));
}

#[test]
fn encode_stroke_keeps_provisional_id_in_body() {
    let body = encode_stroke(&sample_stroke(0)).expect("encode");
    let value: serde_json::Value = serde_json::from_str(&body).expect("json");
    assert_eq!(value["id"], 0);
    assert_eq!(value["points"][1]["x"], 3.5);
}

#[test]
fn decode_room_reads_bootstrap_envelope() {
    let json = r#"{
        "room": {
            "id": 5,
            "name": "lobby",
            "canvas_width": 1028,
            "canvas_height": 768,
            "strokes": [{"id":3,"red":0,"green":0,"blue":0,"alpha":1,"width":2,"points":[{"x":0,"y":0}]}]
        },
        "csrf_token": "tok"
    }"#;
    let envelope = decode_room(json).expect("room should decode");
    assert_eq!(envelope.room.id, 5);
    assert_eq!(envelope.room.name, "lobby");
    assert_eq!(envelope.room.canvas_width, 1028);
    assert_eq!(envelope.room.strokes.len(), 1);
    assert_eq!(envelope.csrf_token.as_deref(), Some("tok"));
}

#[test]
fn decode_room_defaults_missing_token_and_strokes() {
    let json = r#"{"room":{"id":5,"name":"empty","canvas_width":10,"canvas_height":10}}"#;
    let envelope = decode_room(json).expect("room should decode");
    assert!(envelope.room.strokes.is_empty());
    assert!(envelope.csrf_token.is_none());
}

#[test]
fn decode_commit_response_unwraps_stroke_envelope() {
    let json = r#"{"stroke":{"id":42,"red":1,"green":2,"blue":3,"alpha":0.7,"width":20,"points":[{"x":1,"y":1}]}}"#;
    let stroke = decode_commit_response(json).expect("commit response");
    assert_eq!(stroke.id, 42);
}

#[test]
fn decode_commit_response_rejects_unconfirmed_stroke() {
    let json = r#"{"stroke":{"id":0,"red":1,"green":2,"blue":3,"alpha":0.7,"width":20,"points":[{"x":1,"y":1}]}}"#;
    let err = decode_commit_response(json).expect_err("id 0 is not a confirmation");
    assert!(matches!(err, CodecError::Invalid(StrokeError::ProvisionalId)));
}
