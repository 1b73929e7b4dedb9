//! End-to-end behavior of reading interpretation.

use std::str::FromStr;
use std::thread;

use getresults_interp::{
    classify, evaluate_formula, resolve, FormulaError, Interpret, InterpretError,
    ValueInterpreter,
};
use getresults_types::{DataType, Quantifier, RawValue, TestDefinition, TypedValue};
use rust_decimal::{Decimal, RoundingStrategy};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn viral_load() -> TestDefinition {
    TestDefinition::absolute("HIV", DataType::Integer)
        .with_limits(dec("400"), dec("750000"))
        .with_units("copies/mL")
}

#[test]
fn absolute_string_definitions_return_text_unchanged() {
    let def = TestDefinition::absolute("HIVRT", DataType::String);
    for reading in ["POS", "  Not detected ", "<40", "12.500", ""] {
        assert_eq!(
            resolve(&def, reading).unwrap(),
            TypedValue::String(reading.to_string()),
            "{reading:?}"
        );
    }
}

#[test]
fn calculated_string_definitions_render_the_formula_result() {
    for formula in ["LOG10", "{value} + 1"] {
        let def = TestDefinition::calculated("HIVRT", DataType::String, formula);
        for reading in ["750000", "12.500", "1"] {
            let expected = evaluate_formula(formula, reading).unwrap().to_string();
            assert_eq!(
                resolve(&def, reading).unwrap(),
                TypedValue::String(expected),
                "{formula} with {reading:?}"
            );
        }
    }

    let def = TestDefinition::calculated("HIVRT", DataType::String, "{value} + 1");
    assert_eq!(resolve(&def, "12.500").unwrap().to_string(), "13.500");
    assert!(resolve(&def, "POS").unwrap_err().is_invalid_formula());

    let def = TestDefinition::calculated("HIVRT", DataType::String, "LOG10");
    assert!(matches!(
        resolve(&def, "POS"),
        Err(InterpretError::Formula {
            source: FormulaError::NonNumericReading { .. },
            ..
        })
    ));
}

#[test]
fn oversized_precision_is_an_error() {
    let def = TestDefinition::absolute("HGB", DataType::Decimal).with_precision(29);
    assert!(matches!(
        resolve(&def, "1.5"),
        Err(InterpretError::PrecisionOutOfRange { precision: 29, .. })
    ));

    let def = TestDefinition::calculated("PMH", DataType::Decimal, "{value} * 1000")
        .with_precision(28);
    let err = resolve(&def, "2").unwrap_err();
    assert_eq!(err.test(), "PMH");
    assert!(matches!(err, InterpretError::PrecisionOutOfRange { .. }));
}

#[test]
fn integer_rounds_half_away_from_zero() {
    let def = TestDefinition::absolute("CD4", DataType::Integer);
    let cases = [
        ("100.99", 101),
        ("100.49", 100),
        ("100.5", 101),
        ("99.5", 100),
        ("0.5", 1),
        ("-0.5", -1),
        ("-100.5", -101),
    ];
    for (reading, expected) in cases {
        assert_eq!(resolve(&def, reading).unwrap(), TypedValue::Integer(expected), "{reading}");
    }
}

#[test]
fn decimal_rounds_to_precision() {
    let def = TestDefinition::absolute("HGB", DataType::Decimal).with_precision(1);
    assert_eq!(resolve(&def, "100.77").unwrap(), TypedValue::Decimal(dec("100.8")));
    assert_eq!(resolve(&def, "100.75").unwrap().to_string(), "100.8");
    assert_eq!(resolve(&def, "100.74").unwrap().to_string(), "100.7");
    assert_eq!(resolve(&def, dec("100.77")).unwrap().to_string(), "100.8");
}

#[test]
fn log10_formula() {
    for precision in 0..=4 {
        let def =
            TestDefinition::calculated("PMH", DataType::Decimal, "LOG10").with_precision(precision);
        let expected = Decimal::from_f64_retain(750000f64.log10())
            .unwrap()
            .round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
        let value = resolve(&def, "750000").unwrap();
        assert_eq!(value.as_decimal(), Some(expected), "precision {precision}");
        assert_eq!(value.as_decimal().unwrap().scale(), precision);
    }
}

#[test]
fn function_calls_inside_expressions_are_rejected() {
    let def = TestDefinition::calculated("PMH", DataType::Decimal, "1 + log10(100)")
        .with_precision(2);
    let err = resolve(&def, "100").unwrap_err();
    assert!(err.is_invalid_formula(), "{err:?}");
    assert!(err.to_string().contains("1 + log10(100)"));
}

#[test]
fn code_like_formulas_are_rejected() {
    for formula in ["__import__('os').system('true')", "{value}.real", "[1, 2]", "exp(999999)"] {
        let def = TestDefinition::calculated("X", DataType::Integer, formula);
        let err = resolve(&def, "1").unwrap_err();
        assert!(err.is_invalid_formula(), "{formula}: {err:?}");
    }
}

#[test]
fn detection_limits() {
    let def = viral_load();
    assert_eq!(
        classify(&def, "400").unwrap(),
        (Quantifier::Equal, TypedValue::Integer(400))
    );
    assert_eq!(
        classify(&def, "399").unwrap(),
        (Quantifier::LessThan, TypedValue::Integer(400))
    );
    assert_eq!(
        classify(&def, "750000").unwrap(),
        (Quantifier::Equal, TypedValue::Integer(750000))
    );
    assert_eq!(
        classify(&def, "750001").unwrap(),
        (Quantifier::GreaterThan, TypedValue::Integer(750000))
    );
}

#[test]
fn no_limits_always_equal() {
    let definitions = [
        TestDefinition::absolute("CD4", DataType::Integer),
        TestDefinition::absolute("HGB", DataType::Decimal).with_precision(2),
        TestDefinition::calculated("PMH", DataType::Decimal, "LOG10").with_precision(3),
        TestDefinition::absolute("HIVRT", DataType::String),
    ];
    let readings = ["0.001", "1", "399", "750001", "99999999"];

    for def in &definitions {
        for reading in readings {
            let expected = resolve(def, reading).unwrap();
            assert_eq!(classify(def, reading).unwrap(), (Quantifier::Equal, expected));
        }
    }
}

#[test]
fn string_values_are_never_compared_with_limits() {
    let def = TestDefinition::absolute("HIVRT", DataType::String)
        .with_limits(dec("400"), dec("750000"));
    for reading in ["1", "999999999", "POS"] {
        assert_eq!(
            classify(&def, reading).unwrap(),
            (Quantifier::Equal, TypedValue::String(reading.to_string()))
        );
    }
}

#[test]
fn resolve_is_idempotent() {
    let definitions = [
        viral_load(),
        TestDefinition::calculated("PMH", DataType::Decimal, "LOG10").with_precision(4),
        TestDefinition::calculated("CD4%", DataType::Decimal, "{value} * 100 / 3")
            .with_precision(6),
    ];
    for def in &definitions {
        let first = resolve(def, "12345.678").unwrap();
        let second = resolve(def, "12345.678").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
        if let (Some(a), Some(b)) = (first.as_decimal(), second.as_decimal()) {
            assert_eq!(a.serialize(), b.serialize());
        }
    }
}

#[test]
fn errors_are_local_to_the_call() {
    let def = viral_load();
    assert!(matches!(
        classify(&def, "TND"),
        Err(InterpretError::NonNumericReading { .. })
    ));
    assert_eq!(classify(&def, "500").unwrap(), (Quantifier::Equal, TypedValue::Integer(500)));
}

#[test]
fn interpreter_is_shareable_across_threads() {
    let interpreter = ValueInterpreter::default();
    let def = viral_load();

    thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let interpreter = &interpreter;
                let def = &def;
                let reading = RawValue::from(i64::from(i) * 100_000);
                scope.spawn(move || interpreter.classify(def, reading))
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let (quantifier, _) = handle.join().unwrap().unwrap();
            let expected = if i < 1 {
                Quantifier::LessThan
            } else if i * 100_000 > 750_000 {
                Quantifier::GreaterThan
            } else {
                Quantifier::Equal
            };
            assert_eq!(quantifier, expected, "reading {}", i * 100_000);
        }
    });
}

#[test]
fn definition_methods_match_free_functions() {
    let def = TestDefinition::calculated("VL", DataType::Integer, "{value} * 1000")
        .with_limits(dec("40"), dec("1000000"));
    for reading in ["0.01", "0.5", "5000"] {
        assert_eq!(def.value(reading).unwrap(), resolve(&def, reading).unwrap());
        assert_eq!(
            def.value_with_quantifier(reading).unwrap(),
            classify(&def, reading).unwrap()
        );
    }
}

#[test]
fn json_definitions_interpret_like_built_ones() {
    let json = r#"{
        "name": "PMH",
        "description": "log viral load",
        "value_type": "calculated",
        "value_datatype": "decimal",
        "precision": 2,
        "formula": "LOG10",
        "lower_limit": "1.6",
        "upper_limit": "7.0",
        "units": "log cp/mL"
    }"#;
    let def: TestDefinition = serde_json::from_str(json).unwrap();
    assert_eq!(
        classify(&def, "750000").unwrap(),
        (Quantifier::Equal, TypedValue::Decimal(dec("5.88")))
    );
    assert_eq!(
        classify(&def, "20").unwrap(),
        (Quantifier::LessThan, TypedValue::Decimal(dec("1.60")))
    );
}
