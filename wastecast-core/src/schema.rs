//! Statically declared mapping from record fields to MQTT sensors.
//!
//! Both the discovery and the state-publish paths consume this one table,
//! so a field can never drift between the two.

use crate::model::Record;

/// Value kind of a published field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Published as `"ON"`/`"OFF"`, discovered as a `binary_sensor`.
    Bool,
    /// Published as a raw string, discovered as a `sensor`.
    Text,
}

/// Value of a single record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'rec> {
    /// Boolean sensor state.
    Bool(bool),
    /// String sensor state.
    Text(&'rec str),
}

impl FieldValue<'_> {
    /// MQTT state payload for this value.
    ///
    /// The sink skips fields whose payload is empty.
    #[must_use]
    pub fn payload(&self) -> String {
        match self {
            FieldValue::Bool(true) => "ON".to_owned(),
            FieldValue::Bool(false) => "OFF".to_owned(),
            FieldValue::Text(text) => (*text).to_owned(),
        }
    }
}

/// One entry in the publish schema.
pub struct FieldSpec {
    /// Sensor slug, used as a topic segment and a discovery object id.
    pub name: &'static str,
    /// Value kind.
    pub kind: FieldKind,
    /// Home Assistant component the field is discovered under.
    pub component: &'static str,
    /// Excluded from state publishing.
    pub ignore_mqtt: bool,
    /// Excluded from discovery.
    pub ignore_discovery: bool,
    /// Reads this field's value out of a record.
    pub accessor: for<'rec> fn(&'rec Record) -> FieldValue<'rec>,
}

fn address_value(record: &Record) -> FieldValue<'_> {
    FieldValue::Text(&record.address)
}

fn start_value(record: &Record) -> FieldValue<'_> {
    FieldValue::Text(&record.start)
}

fn garbage_value(record: &Record) -> FieldValue<'_> {
    FieldValue::Bool(record.garbage)
}

fn recycling_value(record: &Record) -> FieldValue<'_> {
    FieldValue::Bool(record.recycling)
}

fn food_and_yard_waste_value(record: &Record) -> FieldValue<'_> {
    FieldValue::Bool(record.food_and_yard_waste)
}

fn status_value(record: &Record) -> FieldValue<'_> {
    FieldValue::Bool(record.status)
}

/// Publish schema, in publish order.
pub const FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "address",
        kind: FieldKind::Text,
        component: "",
        ignore_mqtt: true,
        ignore_discovery: true,
        accessor: address_value,
    },
    FieldSpec {
        name: "start",
        kind: FieldKind::Text,
        component: "sensor",
        ignore_mqtt: false,
        ignore_discovery: false,
        accessor: start_value,
    },
    FieldSpec {
        name: "garbage",
        kind: FieldKind::Bool,
        component: "binary_sensor",
        ignore_mqtt: false,
        ignore_discovery: false,
        accessor: garbage_value,
    },
    FieldSpec {
        name: "recycling",
        kind: FieldKind::Bool,
        component: "binary_sensor",
        ignore_mqtt: false,
        ignore_discovery: false,
        accessor: recycling_value,
    },
    FieldSpec {
        name: "foodandyardwaste",
        kind: FieldKind::Bool,
        component: "binary_sensor",
        ignore_mqtt: false,
        ignore_discovery: false,
        accessor: food_and_yard_waste_value,
    },
    FieldSpec {
        name: "status",
        kind: FieldKind::Bool,
        component: "binary_sensor",
        ignore_mqtt: false,
        ignore_discovery: false,
        accessor: status_value,
    },
];

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn sample_record() -> Record {
        Record {
            address: "2133 N 61ST ST".to_owned(),
            start: "Mon, 16 Mar 2017".to_owned(),
            start_date: NaiveDate::from_ymd_opt(2017, 3, 16).expect("valid date"),
            garbage: true,
            recycling: false,
            food_and_yard_waste: false,
            status: false,
        }
    }

    #[test]
    fn schema_order_is_stable() {
        let names: Vec<_> = FIELDS.iter().map(|field| field.name).collect();
        assert_eq!(
            names,
            vec![
                "address",
                "start",
                "garbage",
                "recycling",
                "foodandyardwaste",
                "status"
            ]
        );
    }

    #[test]
    fn address_is_ignored_everywhere() {
        let address = FIELDS
            .iter()
            .find(|field| field.name == "address")
            .expect("address in schema");
        assert!(address.ignore_mqtt);
        assert!(address.ignore_discovery);
    }

    #[test]
    fn booleans_render_on_off() {
        let record = sample_record();
        let payloads: Vec<_> = FIELDS
            .iter()
            .filter(|field| !field.ignore_mqtt)
            .map(|field| (field.name, (field.accessor)(&record).payload()))
            .collect();
        assert_eq!(
            payloads,
            vec![
                ("start", "Mon, 16 Mar 2017".to_owned()),
                ("garbage", "ON".to_owned()),
                ("recycling", "OFF".to_owned()),
                ("foodandyardwaste", "OFF".to_owned()),
                ("status", "OFF".to_owned()),
            ]
        );
    }

    #[test]
    fn components_follow_field_kind() {
        for field in FIELDS.iter().filter(|field| !field.ignore_discovery) {
            match field.kind {
                FieldKind::Bool => assert_eq!(field.component, "binary_sensor"),
                FieldKind::Text => assert_eq!(field.component, "sensor"),
            }
        }
    }
}
