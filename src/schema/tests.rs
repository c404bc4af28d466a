use super::fields::*;
use super::*;

#[test]
fn test_field_display_and_sentinel() {
    assert_eq!(Field::Missing.to_string(), "N/A");
    assert_eq!(Field::float(0.2).to_string(), "0.2");
    assert_eq!(Field::float(120.0).to_string(), "120.0");
    assert_eq!(Field::int(512).to_string(), "512");
    assert_eq!(Field::text("Airyscan").to_string(), "Airyscan");
}

#[test]
fn test_blank_text_is_missing() {
    assert!(Field::text("").is_missing());
    assert!(Field::text("   ").is_missing());
    assert!(Field::from_text(None::<String>).is_missing());
    assert_eq!(Field::from_text(Some("Oil")), Field::text("Oil"));
}

#[test]
fn test_from_rendered_inference() {
    assert_eq!(Field::from_rendered("N/A"), Field::Missing);
    assert_eq!(Field::from_rendered("512"), Field::int(512));
    assert_eq!(Field::from_rendered("0.2"), Field::float(0.2));
    assert_eq!(Field::from_rendered("120.0"), Field::float(120.0));
    assert_eq!(Field::from_rendered("007"), Field::text("007"));
    assert_eq!(Field::from_rendered("2.30"), Field::text("2.30"));
    assert_eq!(Field::from_rendered("Plan-Apochromat 63x/1.40 Oil"), Field::text("Plan-Apochromat 63x/1.40 Oil"));
}

#[test]
fn test_or_else_keeps_first_present() {
    assert_eq!(Field::int(1).or_else(|| Field::int(2)), Field::int(1));
    assert_eq!(Field::Missing.or_else(|| Field::int(2)), Field::int(2));
}

#[test]
fn test_per_channel_display_joins() {
    let value = FieldValue::PerChannel(vec![Field::text("ChS1-T1"), Field::Missing, Field::float(488.0)]);
    assert_eq!(value.to_string(), "ChS1-T1, N/A, 488.0");
}

#[test]
fn test_assemble_orders_and_fills_missing() {
    let mut set = FieldSet::new();
    set.set(SIZE_X, Field::int(512));
    set.set(DOCUMENT_NAME, Field::text("cells"));
    set.set(CHANNEL_NAMES, vec![Field::text("A"), Field::text("B")]);
    set.set("Not A Declared Field", Field::int(1));

    let output = assemble(FileFormat::Czi, set);

    let names: Vec<&str> = output.names().collect();
    assert_eq!(names, CZI_FIELDS.to_vec());
    assert_eq!(output.single(DOCUMENT_NAME), Some(&Field::text("cells")));
    assert_eq!(output.single(SIZE_X), Some(&Field::int(512)));
    assert_eq!(output.single(TIME_INTERVAL), Some(&Field::Missing));
    assert_eq!(output.list(CHANNEL_NAMES).map(<[Field]>::len), Some(2));
    assert!(output.get("Not A Declared Field").is_none());
}

#[test]
fn test_vendor_field_lists_have_no_duplicates() {
    for format in [FileFormat::Czi, FileFormat::Lif, FileFormat::Nd2] {
        let order = fields::field_order(format);
        let mut seen = std::collections::HashSet::new();
        for name in order {
            assert!(seen.insert(*name), "{} declared twice for {}", name, format);
        }
        assert_eq!(order[0], if format == FileFormat::Lif { IMAGE_INDEX } else { DOCUMENT_NAME });
        assert!(order.contains(&CHANNEL_NAMES));
    }
}

#[test]
fn test_output_json_keeps_order_and_arrays() {
    let mut output = MetadataOutput::new();
    output.push(SIZE_X, Field::int(512));
    output.push(PIXEL_SIZE_X, Field::float(0.2));
    output.push(CHANNEL_NAMES, vec![Field::text("A"), Field::Missing]);
    output.push(TIME_INTERVAL, Field::Missing);

    let json = serde_json::to_string(&output).unwrap();
    assert_eq!(
        json,
        r#"{"Size X":512,"Pixel Size X (um)":0.2,"Channel Names":["A","N/A"],"Time Interval (s)":"N/A"}"#
    );
}

#[test]
fn test_push_replaces_in_place() {
    let mut output = MetadataOutput::new();
    output.push("a", Field::int(1));
    output.push("b", Field::int(2));
    output.push("a", Field::int(3));

    assert_eq!(output.len(), 2);
    assert_eq!(output.names().collect::<Vec<_>>(), vec!["a", "b"]);
    assert_eq!(output.single("a"), Some(&Field::int(3)));
}
