use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use facadex::construct::{Literal, Term};
use facadex::datatype::Value;
use facadex::vocab;

fn term(value: impl Into<Value>) -> Option<Term> {
    value.into().to_term()
}

#[test]
fn native_kinds_map_to_xsd_literals() {
    assert_eq!(term("text"), Some(Term::string("text")));
    assert_eq!(term(-7i64), Some(Term::literal("-7", vocab::XSD_LONG)));
    assert_eq!(term(false), Some(Term::literal("false", vocab::XSD_BOOLEAN)));
    assert_eq!(term(1500.0f64), Some(Term::literal("1.5E3", vocab::XSD_DOUBLE)));
    assert_eq!(term(f64::NEG_INFINITY), Some(Term::literal("-INF", vocab::XSD_DOUBLE)));
    assert_eq!(
        term(BigDecimal::from_str("12.50").unwrap()),
        Some(Term::literal("12.50", vocab::XSD_DECIMAL))
    );
    let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
    assert_eq!(term(date), Some(Term::literal("2024-02-29", vocab::XSD_DATE)));
    let moment = date.and_hms_opt(13, 5, 0).unwrap();
    assert_eq!(term(moment), Some(Term::literal("2024-02-29T13:05:00", vocab::XSD_DATE_TIME)));
    assert_eq!(term(vec![0x0fu8, 0xa0]), Some(Term::literal("0FA0", vocab::XSD_HEX_BINARY)));
}

#[test]
fn nulls_have_no_term() {
    assert_eq!(term(Value::Null), None);
    assert_eq!(term(None::<i64>), None);
    assert!(Value::from(None::<&str>).is_null());
    assert_eq!(Value::Null.data_type(), None);
}

#[test]
fn language_tagged_literals_pass_through() {
    let tagged = Literal::with_language("hej", "sv");
    assert_eq!(term(tagged.clone()), Some(Term::Literal(tagged)));
    assert_eq!(Value::from(Literal::with_language("hej", "sv")).data_type(), Some(vocab::RDF_LANG_STRING));
}

#[test]
fn n_triples_escaping() {
    let quoted = Term::string("say \"hi\"\n");
    assert_eq!(quoted.to_string(), "\"say \\\"hi\\\"\\n\"");
    assert_eq!(Term::literal("1", vocab::XSD_LONG).to_string(), format!("\"1\"^^<{}>", vocab::XSD_LONG));
    assert_eq!(Term::Literal(Literal::with_language("hej", "sv")).to_string(), "\"hej\"@sv");
    assert_eq!(Term::blank("b1").to_string(), "_:b1");
}
