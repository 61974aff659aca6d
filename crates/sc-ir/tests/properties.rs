//! Property tests for sc-ir
//!
//! These tests check the type-gating laws of the node factories.

use proptest::prelude::*;
use sc_ir::{
    And, Cast, DataType, Expr, For, ForType, IrError, Iter, Not, Or, Reduce, ReduceType, Store,
    VarExpr, Variable,
};

fn lanes() -> impl Strategy<Value = u16> {
    prop::sample::select(vec![1u16, 2, 4, 8, 16])
}

fn numeric_type() -> impl Strategy<Value = DataType> {
    let base = prop_oneof![
        prop::sample::select(vec![8u8, 16, 32, 64]).prop_map(DataType::int),
        prop::sample::select(vec![8u8, 16, 32, 64]).prop_map(DataType::uint),
        prop::sample::select(vec![16u8, 32, 64]).prop_map(DataType::float),
    ];
    (base, lanes()).prop_map(|(ty, l)| ty.with_lanes(l))
}

fn any_type() -> impl Strategy<Value = DataType> {
    prop_oneof![
        numeric_type(),
        lanes().prop_map(|l| DataType::bool().with_lanes(l)),
    ]
}

// ============================================================
// Logical operators
// ============================================================

proptest! {
    #[test]
    fn logic_on_bools_keeps_lhs_type(l in lanes()) {
        let ty = DataType::bool().with_lanes(l);
        let a = Variable::make(ty, "a").unwrap();
        let b = Variable::make(ty, "b").unwrap();

        prop_assert_eq!(And::make(a.clone(), b.clone()).unwrap().ty(), ty);
        prop_assert_eq!(Or::make(a.clone(), b).unwrap().ty(), ty);
        prop_assert_eq!(Not::make(a).unwrap().ty(), ty);
    }

    #[test]
    fn logic_rejects_non_bool(ty in numeric_type()) {
        let p = Variable::make(DataType::BOOL, "p").unwrap();
        let x = Variable::make(ty, "x").unwrap();

        let is_not_bool = |r: Result<Expr, IrError>| matches!(r, Err(IrError::NotBool { .. }));
        prop_assert!(is_not_bool(And::make(p.clone(), x.clone())));
        prop_assert!(is_not_bool(And::make(x.clone(), p.clone())));
        prop_assert!(is_not_bool(Or::make(x.clone(), p)));
        prop_assert!(is_not_bool(Not::make(x)));
    }
}

// ============================================================
// Casts
// ============================================================

proptest! {
    #[test]
    fn cast_succeeds_iff_lanes_agree(from in any_type(), to in any_type()) {
        let v = Variable::make(from, "v").unwrap();
        let result = Cast::make(to, v);
        prop_assert_eq!(result.is_ok(), from.length() == to.length());
        if let Ok(c) = result {
            prop_assert_eq!(c.ty(), to);
        }
    }
}

// ============================================================
// Statements
// ============================================================

proptest! {
    #[test]
    fn for_requires_matching_scalar_bounds(min_ty in numeric_type(), ext_ty in numeric_type()) {
        let min = Variable::make(min_ty, "lo").unwrap();
        let extent = Variable::make(ext_ty, "n").unwrap();
        let body = Store::make(Variable::make(DataType::I32, "x").unwrap(), Expr::int(0)).unwrap();
        let var = VarExpr::int32("i");

        let result = For::make(ForType::Serial, var.clone(), min.clone(), extent.clone(), body.clone());
        prop_assert_eq!(result.is_ok(), min_ty.is_scalar() && min_ty == ext_ty);
        if let Ok(stmt) = result {
            let node = stmt.cast_to::<For>().unwrap();
            prop_assert_eq!(&node.var, &var);
            prop_assert!(node.min.ptr_eq(&min));
            prop_assert!(node.extent.ptr_eq(&extent));
            prop_assert!(node.body.ptr_eq(&body));
        }
    }

    #[test]
    fn reduce_keeps_iter_order(extents in prop::collection::vec(1i64..64, 0..6)) {
        let iters: Vec<Iter> = extents
            .iter()
            .enumerate()
            .map(|(k, &e)| Iter::reduction(&format!("r{k}"), Expr::int(e)).unwrap())
            .collect();
        let x = Variable::make(DataType::I32, "x").unwrap();

        let stmt = Reduce::make(ReduceType::Add, x, Expr::int(1), iters.clone()).unwrap();
        prop_assert_eq!(&stmt.cast_to::<Reduce>().unwrap().reduce_iters, &iters);
    }

    #[test]
    fn reduce_rejects_normal_iter(pos in 0usize..4) {
        let mut iters: Vec<Iter> = (0..4)
            .map(|k| Iter::reduction(&format!("r{k}"), Expr::int(8)).unwrap())
            .collect();
        iters[pos] = Iter::normal("i", Expr::int(8)).unwrap();
        let x = Variable::make(DataType::I32, "x").unwrap();

        let result = Reduce::make(ReduceType::Max, x, Expr::int(1), iters);
        let rejected = matches!(result, Err(IrError::NotReductionIter { .. }));
        prop_assert!(rejected);
    }
}
