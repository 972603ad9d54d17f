use proptest::prelude::*;
use zohocrm_response::{parse, PositionKey, RecordSet, ResponseError};

// ── Service errors short-circuit everything ───────────────────────────────

proptest! {
    #[test]
    fn error_node_always_surfaces(
        code in "[0-9]{4}",
        message in "[A-Za-z ]{0,40}",
        uri in "/[a-z/]{0,30}",
        method in prop::sample::select(vec!["getFields", "getUsers", "getRecords", "deleteRecords"]),
    ) {
        let xml = format!(
            "<response uri=\"{uri}\"><result><Leads><row no=\"1\"/></Leads></result><error><code>{code}</code><message>{message}</message></error></response>"
        );
        let err = parse(&xml, "Leads", method).unwrap_err();
        prop_assert_eq!(err, ResponseError::Api { uri, code, message });
    }

    #[test]
    fn nodata_always_empty(
        code in "[0-9]{4}",
        message in "[A-Za-z ]{0,40}",
        method in "[a-zA-Z]{1,20}",
    ) {
        let xml = format!(
            "<response><nodata><code>{code}</code><message>{message}</message></nodata></response>"
        );
        let response = parse(&xml, "Leads", &method).unwrap();
        prop_assert!(response.records().is_empty());
        prop_assert_eq!(response.status_code(), Some(code.as_str()));
        prop_assert_eq!(response.status_message(), Some(message.as_str()));
    }
}

// ── Field metadata coercions ──────────────────────────────────────────────

proptest! {
    #[test]
    fn field_flags_are_exactly_true(
        req in prop::sample::select(vec!["true", "false", "TRUE", "1", "yes", ""]),
        maxlength in prop::option::of(0u32..100_000),
    ) {
        let maxlength_attr = maxlength.map(|m| m.to_string()).unwrap_or_else(|| "n/a".to_string());
        let xml = format!(
            "<Leads><section name=\"S\"><FL req=\"{req}\" isreadonly=\"{req}\" customfield=\"{req}\" maxlength=\"{maxlength_attr}\" type=\"Text\" label=\"F\" dv=\"F\"/></section></Leads>"
        );
        let response = parse(&xml, "Leads", "getFields").unwrap();
        let RecordSet::FieldMetadata(sections) = response.records() else {
            return Err(TestCaseError::fail("expected field metadata"));
        };
        let field = &sections["S"]["F"];
        let expected = req == "true";
        prop_assert_eq!(field.required, expected);
        prop_assert_eq!(field.read_only, expected);
        prop_assert_eq!(field.custom_field, expected);
        prop_assert_eq!(field.max_length, maxlength.map(i64::from).unwrap_or(0));
    }
}

// ── Bulk outcomes are ordered by numeric row position ─────────────────────

proptest! {
    #[test]
    fn bulk_positions_strictly_ascending(
        positions in prop::collection::hash_set(1u32..10_000, 1..20),
    ) {
        let rows: String = positions
            .iter()
            .map(|no| format!("<row no=\"{no}\"><success><code>2000</code><details><FL val=\"Id\">{no}</FL></details></success></row>"))
            .collect();
        let xml = format!("<response><result>{rows}</result></response>");
        let response = parse(&xml, "Leads", "insertRecords").unwrap();
        let RecordSet::Outcomes(outcomes) = response.records() else {
            return Err(TestCaseError::fail("expected outcomes"));
        };
        let keys: Vec<u128> = outcomes.keys().filter_map(PositionKey::numeric).collect();
        prop_assert_eq!(keys.len(), positions.len());
        prop_assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
    }
}

// ── Deletion ids are the long digit runs of the message ───────────────────

proptest! {
    #[test]
    fn deletion_ids_joined_in_order(
        ids in prop::collection::vec("[1-9][0-9]{15,19}", 0..4),
        short in prop::collection::vec("[0-9]{1,15}", 0..3),
    ) {
        let mut parts: Vec<String> = short.iter().map(|s| format!("ref {s}")).collect();
        parts.extend(ids.iter().cloned());
        let message = format!("Record Id(s) : {},Record(s) deleted successfully", parts.join(","));
        let xml = format!("<response><result><message>{message}</message><code>5000</code></result></response>");

        let response = parse(&xml, "Leads", "deleteRecords").unwrap();
        let expected = ids.join(";");
        prop_assert_eq!(response.primary_record_id(), Some(expected.as_str()));
    }
}

// ── Parsing is deterministic ──────────────────────────────────────────────

proptest! {
    #[test]
    fn parse_is_idempotent(
        positions in prop::collection::vec(1u32..500, 1..10),
        values in prop::collection::vec("[a-z]{1,8}", 1..6),
    ) {
        let rows: String = positions
            .iter()
            .map(|no| format!("<row no=\"{no}\"><error><code>4835</code><details>bad {no}</details></error></row>"))
            .collect();
        let bulk = format!("<response><result>{rows}</result></response>");
        prop_assert_eq!(
            parse(&bulk, "Leads", "insertRecords").unwrap(),
            parse(&bulk, "Leads", "insertRecords").unwrap()
        );

        let picklist: String = values.iter().map(|v| format!("<val>{v}</val>")).collect();
        let fields = format!(
            "<Leads><section name=\"S\"><FL label=\"P\" type=\"Pick List\">{picklist}</FL></section></Leads>"
        );
        let first = parse(&fields, "Leads", "getFields").unwrap();
        prop_assert_eq!(&first, &parse(&fields, "Leads", "getFields").unwrap());

        let RecordSet::FieldMetadata(sections) = first.records() else {
            return Err(TestCaseError::fail("expected field metadata"));
        };
        prop_assert_eq!(sections["S"]["P"].values.as_ref(), Some(&values));
    }
}
