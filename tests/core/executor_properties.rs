//! Atomic executor properties

use crate::common::*;
use atomdoc::apply;
use proptest::prelude::*;

fn scalar() -> impl Strategy<Value = Document> {
    prop_oneof![
        Just(Document::Null),
        any::<bool>().prop_map(Document::Bool),
        any::<i64>().prop_map(Document::Int),
        (-1e9f64..1e9).prop_map(Document::Float),
        "[a-z]{0,6}".prop_map(Document::String),
        prop::collection::vec(any::<u8>(), 0..4).prop_map(Document::Bytes),
    ]
}

proptest! {
    #[test]
    fn add_then_sub_restores_int(start in -1_000_000i64..1_000_000, n in -1_000_000i64..1_000_000) {
        let added = apply(Document::Int(start), AtomicOp::Add, &Document::Int(n)).unwrap();
        let back = apply(added, AtomicOp::Sub, &Document::Int(n)).unwrap();
        prop_assert_eq!(back, Document::Int(start));
    }

    #[test]
    fn add_on_missing_is_operand(n in any::<i64>()) {
        prop_assert_eq!(
            apply(Document::Null, AtomicOp::Add, &Document::Int(n)).unwrap(),
            Document::Int(n)
        );
    }

    #[test]
    fn add_then_sub_on_missing_is_zero(n in -1_000_000i64..1_000_000) {
        let added = apply(Document::Null, AtomicOp::Add, &Document::Int(n)).unwrap();
        let back = apply(added, AtomicOp::Sub, &Document::Int(n)).unwrap();
        prop_assert_eq!(back, Document::Int(0));
    }

    #[test]
    fn set_always_yields_operand(current in scalar(), operand in scalar()) {
        prop_assert_eq!(apply(current, AtomicOp::Set, &operand).unwrap(), operand);
    }

    #[test]
    fn arithmetic_rejects_non_numeric_current(
        s in "[a-z]{0,6}",
        op in prop::sample::select(vec![AtomicOp::Add, AtomicOp::Sub, AtomicOp::Mul, AtomicOp::Div, AtomicOp::Mod]),
    ) {
        for current in [Document::String(s.clone()), Document::Bool(true), Document::map(), Document::list()] {
            let err = apply(current, op, &Document::Int(1)).unwrap_err();
            prop_assert!(err.is_type_error());
        }
    }

    #[test]
    fn min_max_bracket_inputs(a in any::<i64>(), b in any::<i64>()) {
        let lo = apply(Document::Int(a), AtomicOp::Min, &Document::Int(b)).unwrap();
        let hi = apply(Document::Int(a), AtomicOp::Max, &Document::Int(b)).unwrap();
        prop_assert_eq!(lo, Document::Int(a.min(b)));
        prop_assert_eq!(hi, Document::Int(a.max(b)));
    }

    #[test]
    fn checked_add_never_wraps(a in any::<i64>(), b in any::<i64>()) {
        match a.checked_add(b) {
            Some(sum) => prop_assert_eq!(
                apply(Document::Int(a), AtomicOp::Add, &Document::Int(b)).unwrap(),
                Document::Int(sum)
            ),
            None => {
                let overflowed = matches!(
                    apply(Document::Int(a), AtomicOp::Add, &Document::Int(b)),
                    Err(Error::Overflow { .. })
                );
                prop_assert!(overflowed, "{} + {} did not overflow", a, b);
            }
        }
    }

    // Quarter and eighth steps are exact in f64, so the round trip is exact too
    #[test]
    fn add_then_sub_restores_float(start in -1_000_000i64..1_000_000, n in -1_000_000i64..1_000_000) {
        let start = start as f64 / 4.0;
        let n = Document::Float(n as f64 / 8.0);
        let added = apply(Document::Float(start), AtomicOp::Add, &n).unwrap();
        let back = apply(added, AtomicOp::Sub, &n).unwrap();
        prop_assert_eq!(back, Document::Float(start));
    }

    #[test]
    fn add_then_sub_widens_int_to_float(start in -1_000_000i64..1_000_000, n in -1_000_000i64..1_000_000) {
        let n = Document::Float(n as f64 / 8.0);
        let added = apply(Document::Int(start), AtomicOp::Add, &n).unwrap();
        prop_assert_eq!(added.type_of(), atomdoc::DocumentType::Float);
        let back = apply(added, AtomicOp::Sub, &n).unwrap();
        prop_assert_eq!(back, Document::Float(start as f64));
    }

    #[test]
    fn add_then_sub_on_missing_float_is_zero(n in -1_000_000i64..1_000_000) {
        let n = Document::Float(n as f64 / 8.0);
        let added = apply(Document::Null, AtomicOp::Add, &n).unwrap();
        let back = apply(added, AtomicOp::Sub, &n).unwrap();
        prop_assert_eq!(back, Document::Float(0.0));
    }

    // Near 2^53 the f64 cast of an Int is lossy; the pick must still be exact
    #[test]
    fn int_float_min_max_exact_near_precision_limit(offset in -64i64..64, step in -8i64..8) {
        let i = (1i64 << 53) + offset;
        let f = ((1i64 << 53) + step * 2) as f64;
        let lo = apply(Document::Int(i), AtomicOp::Min, &Document::Float(f)).unwrap();
        let hi = apply(Document::Int(i), AtomicOp::Max, &Document::Float(f)).unwrap();
        let f_exact = f as i64;
        prop_assert_eq!(lo, if f_exact < i { Document::Float(f) } else { Document::Int(i) });
        prop_assert_eq!(hi, if f_exact > i { Document::Float(f) } else { Document::Int(i) });
    }
}

#[test]
fn division_by_zero_for_every_numeric_pairing() {
    for current in [Document::Int(7), Document::Float(7.0)] {
        for zero in [Document::Int(0), Document::Float(0.0)] {
            for op in [AtomicOp::Div, AtomicOp::Mod] {
                assert_eq!(
                    apply(current.clone(), op, &zero).unwrap_err(),
                    Error::DivideByZero
                );
            }
        }
    }
}

#[test]
fn mixed_int_float_widens() {
    assert_eq!(
        apply(Document::Int(1), AtomicOp::Add, &Document::Float(0.5)).unwrap(),
        Document::Float(1.5)
    );
    assert_eq!(
        apply(Document::Float(3.0), AtomicOp::Mul, &Document::Int(2)).unwrap(),
        Document::Float(6.0)
    );
}
