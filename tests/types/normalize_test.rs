use relbridge::types::{
    known_type, normalize, AggregateFunction, CanonicalType, ComparisonOperator, Representation,
    SourceDialect, TypeContext,
};

fn bare(vendor_type: &str) -> CanonicalType {
    normalize(vendor_type, &TypeContext::bare()).scalar_type
}

#[test]
fn test_table_spellings() {
    let cases = [
        ("VARCHAR(65536)", CanonicalType::Varchar),
        ("JavaType(class java.util.ArrayList)", CanonicalType::List),
        ("JavaType(class java.lang.Integer)", CanonicalType::Integer),
        ("SMALLINT NOT NULL", CanonicalType::Integer),
        ("BIGINT", CanonicalType::Integer),
        ("FLOAT NOT NULL", CanonicalType::Float),
        ("DOUBLE", CanonicalType::Double),
        ("BOOLEAN NOT NULL", CanonicalType::Boolean),
        ("BINARY", CanonicalType::Binary),
        ("VARBINARY NOT NULL", CanonicalType::Varbinary),
        ("DATE", CanonicalType::Date),
        ("TIMESTAMP(3) NOT NULL", CanonicalType::Timestamp),
        ("TIMESTAMP", CanonicalType::Timestamptz),
        ("DECIMAL(12,2)", CanonicalType::Float),
    ];
    for (vendor, expected) in cases {
        assert_eq!(known_type(vendor), Some(expected), "{}", vendor);
        assert_eq!(bare(vendor), expected, "{}", vendor);
    }
}

#[test]
fn test_not_null_spelling_matches_nullable_spelling() {
    for base in ["INTEGER", "DOUBLE", "BOOLEAN", "DATE", "TIME(0)", "TIMESTAMP(0)", "VARCHAR"] {
        assert_eq!(bare(base), bare(&format!("{} NOT NULL", base)), "{}", base);
    }
}

#[test]
fn test_substring_rules() {
    assert_eq!(bare("CHARACTER VARYING / varchar2"), CanonicalType::Varchar);
    assert_eq!(bare("timestamp with time zone"), CanonicalType::Timestamp);
    assert_eq!(bare("Decimal(5,0)"), CanonicalType::Float);
    assert_eq!(bare("ANY"), CanonicalType::Varbinary);
    // "any" must lead; elsewhere it does not count.
    assert_eq!(bare("MANY"), CanonicalType::Varchar);
}

#[test]
fn test_unknown_type_falls_back_with_diagnostic() {
    let ctx = TypeContext::new(SourceDialect::Generic, "parcels", "outline");
    let normalized = normalize("GEOGRAPHY", &ctx);
    assert_eq!(normalized.scalar_type, CanonicalType::Varchar);

    let diagnostic = normalized.diagnostic.expect("diagnostic for unknown type");
    assert_eq!(diagnostic.type_name, "GEOGRAPHY");
    assert_eq!(
        diagnostic.to_string(),
        "unknown column type 'GEOGRAPHY' for parcels.outline, using VARCHAR"
    );
}

#[test]
fn test_sqlite_date_text_override() {
    let sqlite = |column: &'static str| TypeContext::new(SourceDialect::Sqlite, "orders", column);

    assert_eq!(
        normalize("VARCHAR(65536)", &sqlite("ship_DATE")).scalar_type,
        CanonicalType::Timestamp
    );
    assert_eq!(
        normalize("VARCHAR(65536)", &sqlite("status")).scalar_type,
        CanonicalType::Varchar
    );
    // Plain substring match: "updated" counts as a date column.
    assert_eq!(
        normalize("VARCHAR(65536)", &sqlite("updated")).scalar_type,
        CanonicalType::Timestamp
    );
    assert_eq!(
        normalize("INTEGER", &sqlite("date_key")).scalar_type,
        CanonicalType::Integer
    );
    assert_eq!(
        normalize(
            "VARCHAR(65536)",
            &TypeContext::new(SourceDialect::Generic, "orders", "ship_date")
        )
        .scalar_type,
        CanonicalType::Varchar
    );
}

#[test]
fn test_dialect_from_product_name() {
    assert_eq!(SourceDialect::from_name("SQLite"), SourceDialect::Sqlite);
    assert_eq!(SourceDialect::from_name("sqlite3"), SourceDialect::Sqlite);
    assert_eq!(SourceDialect::from_name("PostgreSQL"), SourceDialect::Generic);
}

#[test]
fn test_normalize_is_deterministic() {
    let ctx = TypeContext::new(SourceDialect::Sqlite, "t", "c");
    for vendor in ["INTEGER", "weird", "VARCHAR(65536)", "TIMESTAMP(9)"] {
        assert_eq!(normalize(vendor, &ctx), normalize(vendor, &ctx));
    }
}

#[test]
fn test_capabilities() {
    let text = CanonicalType::Varchar.capabilities();
    assert_eq!(text.representation, Representation::String);
    assert!(text.comparison_operators.contains(&ComparisonOperator::Like));
    assert!(text.aggregate_functions.is_empty());
    assert_eq!(text.aggregate_result, None);

    let double = CanonicalType::Double.capabilities();
    assert_eq!(double.representation, Representation::Float64);
    assert_eq!(
        double.aggregate_functions,
        &[
            AggregateFunction::Sum,
            AggregateFunction::Max,
            AggregateFunction::Avg,
            AggregateFunction::Min
        ]
    );
    assert_eq!(double.aggregate_result, Some(CanonicalType::Double));

    assert_eq!(
        CanonicalType::List.capabilities().representation,
        Representation::Json
    );
}
