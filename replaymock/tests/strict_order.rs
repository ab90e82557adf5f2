// vim: tw=80
//! Strict mocks enforce the recording order; the other modes don't.

use replaymock::*;

#[stand_in]
pub trait Ledger {
    fn open(&self);
    fn write(&self, x: u32);
    fn close(&self) -> bool;
}

fn record(mock: &mut MockLedger) {
    mock.open();
    mock.write(1);
    mock.write(2);
    expect(mock, |m| m.close()).and_return(true);
}

#[test]
fn in_order() {
    let mut mock = create_strict_mock::<MockLedger>();
    record(&mut mock);
    replay(&mock);
    mock.open();
    mock.write(1);
    mock.write(2);
    assert!(mock.close());
    verify(&mock);
}

#[test]
#[should_panic(expected = "Unexpected call Ledger.write(2)")]
fn out_of_order() {
    let mut mock = create_strict_mock::<MockLedger>();
    record(&mut mock);
    replay(&mock);
    mock.open();
    mock.write(2);
}

#[test]
fn default_mode_ignores_order() {
    let mut mock = create_mock::<MockLedger>();
    record(&mut mock);
    replay(&mock);
    assert!(mock.close());
    mock.write(2);
    mock.write(1);
    mock.open();
    verify(&mock);
}

#[test]
fn nice_mode_ignores_order() {
    let mut mock = create_nice_mock::<MockLedger>();
    record(&mut mock);
    replay(&mock);
    mock.write(2);
    mock.open();
    mock.write(1);
    assert!(mock.close());
    verify(&mock);
}

/// An expectation whose minimum is met may be passed over
#[test]
fn skip_satisfied_range() {
    let mut mock = create_strict_mock::<MockLedger>();
    expect(&mut mock, |m| m.write(1)).times(1, 3);
    expect(&mut mock, |m| m.close()).and_return(true);
    replay(&mock);
    mock.write(1);
    assert!(mock.close());
    verify(&mock);
}

#[test]
fn repeat_within_range() {
    let mut mock = create_strict_mock::<MockLedger>();
    expect(&mut mock, |m| m.write(1)).times(1, 3);
    expect(&mut mock, |m| m.close()).and_return(true);
    replay(&mock);
    mock.write(1);
    mock.write(1);
    mock.write(1);
    assert!(mock.close());
    verify(&mock);
}

/// An expectation may not be skipped before its minimum is met
#[test]
#[should_panic(expected = "Unexpected call Ledger.close()")]
fn unsatisfied_head_blocks() {
    let mut mock = create_strict_mock::<MockLedger>();
    expect(&mut mock, |m| m.write(1)).times(2, 3);
    expect(&mut mock, |m| m.close()).and_return(true);
    replay(&mock);
    mock.write(1);
    mock.close();
}

/// Once the order has moved on, earlier expectations can't be revisited
#[test]
#[should_panic(expected = "Unexpected call Ledger.write(1)")]
fn no_going_back() {
    let mut mock = create_strict_mock::<MockLedger>();
    mock.open();
    expect(&mut mock, |m| m.write(1)).any_times();
    mock.open();
    replay(&mock);
    mock.open();
    mock.open();
    mock.write(1);
}

#[test]
fn failure_points_at_the_due_call() {
    let (mut mock, control) =
        create_stand_in::<MockLedger>(BehaviorMode::Strict, None).unwrap();
    record(&mut mock);
    control.replay().unwrap();
    let write = interceptor_of(&mock).signature(1);
    control.invoke(interceptor_of(&mock).signature(0), &[]).unwrap();
    let e = control.invoke(write, &[&2u32]).unwrap_err();
    let MockError::UnexpectedCall(unexpected) = e else {
        panic!("Wrong error");
    };
    assert_eq!("Ledger.write(2)", unexpected.call);
    assert_eq!(4, unexpected.queue.len());
    assert!(!unexpected.queue[0].starts_with("-> "));
    assert!(unexpected.queue[1].starts_with("-> Ledger.write("),
            "{:?}", unexpected.queue);
    assert!(!unexpected.queue[2].starts_with("-> "));
}

/// Stubs answer whenever nothing ordered does, without disturbing the order
#[test]
fn stubs_are_unordered() {
    let mut mock = create_strict_mock::<MockLedger>();
    mock.open();
    expect(&mut mock, |m| m.close()).and_stub_return(false);
    mock.write(1);
    replay(&mock);
    assert!(!mock.close());
    mock.open();
    assert!(!mock.close());
    mock.write(1);
    verify(&mock);
}
