mod common;

use common::{Countdown, Point, detail, int, registry};
use mela_script::errors::messages;
use proptest::prelude::*;

fn collect(obj: &mela_script::DynObject<'_>) -> Vec<i64> {
    let mut seen = Vec::new();
    obj.iterate(|item| seen.push(item.cast::<i64>().unwrap()))
        .unwrap();
    seen
}

#[test]
fn iterates_in_forward_order() {
    let types = registry();
    let list = types.object(vec![3_i64, 1, 2]).unwrap();
    assert_eq!(collect(&list), vec![3, 1, 2]);

    let items = list.items().unwrap();
    assert_eq!(items.len(), 3);
    assert!(items.iter().all(|item| item.type_name() == "int"));
}

#[test]
fn custom_adapter_order_is_kept() {
    let types = registry();
    let countdown = types.object(Countdown(vec![1, 2, 3])).unwrap();
    assert_eq!(collect(&countdown), vec![3, 2, 1]);
}

#[test]
fn empty_sequence_visits_nothing() {
    let types = registry();
    let list = types.object(Vec::<i64>::new()).unwrap();
    assert!(collect(&list).is_empty());
}

#[test]
fn iteration_sees_mutations_made_through_methods() {
    let types = registry();
    let mut list = types.share(vec![1_i64]).unwrap();
    list.call("push", &[int(&types, 2)]).unwrap();
    assert_eq!(list.get(&["len"]).unwrap().cast::<i64>().unwrap(), 2);
    assert_eq!(collect(&list), vec![1, 2]);
}

#[test]
fn non_iterable_type_is_member_not_found() {
    let types = registry();
    let p = types.object(Point::default()).unwrap();
    let err = p.iterate(|_| {}).unwrap_err();
    assert!(err.is_member_not_found());
    assert_eq!(detail(&err), messages::NOT_ITERABLE);
    assert!(!p.descriptor().is_iterable());
}

proptest! {
    #[test]
    fn iteration_matches_the_native_sequence(values in proptest::collection::vec(any::<i64>(), 0..32)) {
        let types = registry();
        let list = types.object(values.clone()).unwrap();
        prop_assert_eq!(collect(&list), values.clone());

        let countdown = types.object(Countdown(values.clone())).unwrap();
        let mut reversed = values;
        reversed.reverse();
        prop_assert_eq!(collect(&countdown), reversed);
    }
}
