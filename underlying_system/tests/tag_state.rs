use chrono::{DateTime, Duration, TimeZone, Utc};
use underlying_system::tags::structures::{
    BlockId, DataType, EuRange, Labels, TagType, ValueVariant,
};
use underlying_system::TagState;

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn sample_tag() -> TagState {
    let mut tag = TagState::new("Boiler", "Temp1");
    tag.set_description("Outlet temperature");
    tag.set_engineering_units("°C");
    tag.set_data_type(DataType::Analog);
    tag.set_tag_type(TagType::Input);
    tag.set_value(ValueVariant::Float(72.5));
    tag.set_timestamp(t0());
    tag.set_writeable(false);
    tag.set_eu_range(Some(EuRange::new(vec![100.0, 0.0])));
    tag.set_labels(Some(Labels::new(vec!["High".into(), "Low".into()])));
    tag
}

#[test]
fn accessors_return_last_assigned_value() {
    let mut tag = TagState::default();
    tag.set_block(BlockId::new("Line2"));
    tag.set_name("Flow");
    tag.set_description("Feed flow");
    tag.set_engineering_units("m³/h");
    tag.set_data_type(DataType::Integer);
    tag.set_tag_type(TagType::Output);
    tag.set_value(ValueVariant::Int(12));
    tag.set_timestamp(t0());
    tag.set_writeable(true);

    assert_eq!(tag.block(), &BlockId::new("Line2"));
    assert_eq!(tag.name(), "Flow");
    assert_eq!(tag.description(), "Feed flow");
    assert_eq!(tag.engineering_units(), "m³/h");
    assert_eq!(tag.data_type(), DataType::Integer);
    assert_eq!(tag.tag_type(), TagType::Output);
    assert_eq!(tag.value(), &ValueVariant::Int(12));
    assert_eq!(tag.timestamp(), t0());
    assert!(tag.is_writeable());

    tag.set_value(ValueVariant::Int(13));
    tag.set_writeable(false);
    assert_eq!(tag.value(), &ValueVariant::Int(13));
    assert!(!tag.is_writeable());
}

#[test]
fn snapshot_is_a_separate_record_with_equal_scalars() {
    let tag = sample_tag();
    let snap = tag.create_snapshot();

    assert!(!std::ptr::eq(&tag, &snap));
    assert_eq!(snap.block(), tag.block());
    assert_eq!(snap.name(), tag.name());
    assert_eq!(snap.description(), tag.description());
    assert_eq!(snap.engineering_units(), tag.engineering_units());
    assert_eq!(snap.data_type(), tag.data_type());
    assert_eq!(snap.tag_type(), tag.tag_type());
    assert_eq!(snap.value(), tag.value());
    assert_eq!(snap.timestamp(), tag.timestamp());
    assert_eq!(snap.is_writeable(), tag.is_writeable());
}

#[test]
fn scalar_changes_do_not_cross_between_original_and_snapshot() {
    let mut tag = sample_tag();
    let mut snap = tag.create_snapshot();

    tag.set_description("changed on original");
    tag.set_writeable(true);
    assert_eq!(snap.description(), "Outlet temperature");
    assert!(!snap.is_writeable());

    snap.set_engineering_units("K");
    snap.set_value(ValueVariant::Float(1.0));
    assert_eq!(tag.engineering_units(), "°C");
    assert_eq!(tag.value(), &ValueVariant::Float(72.5));
}

#[test]
fn element_changes_in_shared_sequences_are_visible_through_both() {
    let tag = sample_tag();
    let snap = tag.create_snapshot();

    assert!(tag.eu_range().unwrap().set(0, 150.0));
    assert_eq!(snap.eu_range().unwrap().high_eu(), Some(150.0));

    assert!(snap.labels().unwrap().set(1, "Very low".into()));
    assert_eq!(tag.labels().unwrap().get(1).as_deref(), Some("Very low"));
    assert!(tag.shares_sequences_with(&snap));
}

#[test]
fn temp1_value_update_after_snapshot() {
    let mut tag = sample_tag();
    let snap = tag.create_snapshot();
    let t1 = t0() + Duration::seconds(5);

    tag.set_value(ValueVariant::Float(73.0));
    tag.set_timestamp(t1);

    assert_eq!(tag.value(), &ValueVariant::Float(73.0));
    assert_eq!(tag.timestamp(), t1);
    assert_eq!(snap.value(), &ValueVariant::Float(72.5));
    assert_eq!(snap.timestamp(), t0());
}

#[test]
fn two_and_four_element_ranges_are_accepted() {
    let mut tag = sample_tag();
    tag.set_eu_range(Some(EuRange::new(vec![100.0, 0.0])));
    assert_eq!(tag.eu_range().unwrap().len(), 2);

    tag.set_eu_range(Some(EuRange::new(vec![100.0, 0.0, 120.0, -20.0])));
    let range = tag.eu_range().unwrap();
    assert_eq!(range.to_vec(), vec![100.0, 0.0, 120.0, -20.0]);
    assert_eq!(range.low_instrument(), Some(-20.0));
}

#[test]
fn setters_do_not_validate() {
    let mut tag = TagState::new("Pump", "Running");
    tag.set_data_type(DataType::Digital);
    tag.set_value(ValueVariant::String("not a bool".into()));
    tag.set_eu_range(Some(EuRange::new(vec![1.0, 2.0, 3.0])));
    tag.set_labels(Some(Labels::new(vec!["only one".into()])));

    assert_eq!(tag.value(), &ValueVariant::String("not a bool".into()));
    assert_eq!(tag.eu_range().unwrap().len(), 3);
    assert_eq!(tag.labels().unwrap().len(), 1);
}

#[test]
fn snapshot_serializes_to_json() {
    let snap = sample_tag().create_snapshot();
    let json = serde_json::to_value(&snap).unwrap();
    assert_eq!(json["block"], "Boiler");
    assert_eq!(json["name"], "Temp1");
    assert_eq!(json["data_type"], "analog");
    assert_eq!(json["value"], 72.5);
    assert_eq!(json["eu_range"], serde_json::json!([100.0, 0.0]));
}
