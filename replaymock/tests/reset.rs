// vim: tw=80
//! Resetting a control discards everything but its mode

use replaymock::*;

#[stand_in]
pub trait Clock {
    fn now(&self) -> u64;
    fn tick(&self);
}

#[test]
fn back_to_recording() {
    let mut mock = create_strict_mock::<MockClock>();
    expect(&mut mock, |m| m.now()).and_return(5);
    replay(&mock);
    assert_eq!(5, mock.now());

    reset(&mock);
    let control = control_of(&mock);
    assert_eq!(LifecycleState::Record, control.state());
    assert_eq!(BehaviorMode::Strict, control.mode());
    assert_eq!(0, control.expectation_count());

    expect(&mut mock, |m| m.now()).and_return(6);
    replay(&mock);
    assert_eq!(6, mock.now());
    verify(&mock);
}

#[test]
fn forgets_unmet_and_unexpected() {
    let (mut mock, control) =
        create_stand_in::<MockClock>(BehaviorMode::Default, None).unwrap();
    expect(&mut mock, |m| m.now()).and_return(1);
    control.replay().unwrap();
    let tick = interceptor_of(&mock).signature(1);
    control.invoke(tick, &[]).unwrap_err();
    control.verify().unwrap_err();

    control.reset();
    control.replay().unwrap();
    control.verify().unwrap();
}

#[test]
fn reset_while_recording() {
    let mock = create_mock::<MockClock>();
    mock.tick();
    reset(&mock);
    assert_eq!(0, control_of(&mock).expectation_count());
    replay(&mock);
    verify(&mock);
}

#[test]
#[should_panic(expected = "modifying an expectation recorded before the last \
                           reset is not allowed")]
fn stale_builder() {
    let mut mock = create_mock::<MockClock>();
    let mut builder = expect(&mut mock, |m| m.now());
    reset(&mock);
    mock.now();
    builder.and_return(5);
}

#[test]
#[should_panic(expected = "modifying an expectation is not allowed while the \
                           control is in the replay state")]
fn builder_after_replay() {
    let mut mock = create_mock::<MockClock>();
    let mut builder = expect(&mut mock, |m| m.tick());
    replay(&mock);
    builder.times(1, 2);
}
