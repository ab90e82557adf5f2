// vim: tw=80
//! The different ways an expectation can respond to a call
use std::{
    cell::Cell,
    panic::{catch_unwind, AssertUnwindSafe},
    rc::Rc,
    sync::{Arc, OnceLock, atomic::{AtomicBool, AtomicUsize, Ordering}},
    thread,
};

use replaymock::*;

#[derive(Clone, Debug, PartialEq)]
pub enum DiskError {
    Full,
}

#[stand_in]
pub trait Disk {
    fn read(&self, sector: u64) -> Result<Vec<u8>, DiskError>;
    fn free(&self) -> u64;
    fn sync(&self);
}

#[stand_in]
pub trait Math {
    fn fact(&self, n: u64) -> u64;
    fn one(&self) -> u64;
}

static FAIL_NEXT_CLONE: AtomicBool = AtomicBool::new(false);

#[derive(Debug, Default, PartialEq)]
pub struct Token(u32);

impl Clone for Token {
    fn clone(&self) -> Self {
        if FAIL_NEXT_CLONE.swap(false, Ordering::SeqCst) {
            panic!("clone failed");
        }
        Token(self.0)
    }
}
default_return!(Token);

#[stand_in]
pub trait Vault {
    fn token(&self) -> Token;
}

static FAIL_NEXT_DROP: AtomicBool = AtomicBool::new(false);

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Fuse(u32);

impl Drop for Fuse {
    fn drop(&mut self) {
        if FAIL_NEXT_DROP.swap(false, Ordering::SeqCst) {
            panic!("fuse blew");
        }
    }
}
default_return!(Fuse);

#[stand_in]
pub trait Panel {
    fn fuse(&self) -> Fuse;
    fn volts(&self) -> u32;
}

#[test]
fn and_return_err() {
    let mut mock = create_mock::<MockDisk>();
    expect(&mut mock, |m| m.read(0)).and_return(Err(DiskError::Full));
    replay(&mock);
    assert_eq!(Err(DiskError::Full), mock.read(0));
    verify(&mock);
}

#[test]
fn and_return_is_cloned() {
    let mut mock = create_mock::<MockDisk>();
    expect(&mut mock, |m| m.read(3))
        .and_return(Ok(vec![1, 2, 3]))
        .times_exactly(2);
    replay(&mock);
    assert_eq!(Ok(vec![1, 2, 3]), mock.read(3));
    assert_eq!(Ok(vec![1, 2, 3]), mock.read(3));
    verify(&mock);
}

#[test]
#[should_panic(expected = "disk on fire")]
fn and_panic() {
    let mut mock = create_mock::<MockDisk>();
    expect(&mut mock, |m| m.free()).and_panic("disk on fire");
    replay(&mock);
    mock.free();
}

#[test]
#[should_panic(expected = "cable unplugged")]
fn and_panic_on_unit_method() {
    let mut mock = create_mock::<MockDisk>();
    expect(&mut mock, |m| m.sync()).and_panic("cable unplugged");
    replay(&mock);
    mock.sync();
}

#[test]
fn and_answer() {
    let mut mock = create_mock::<MockDisk>();
    expect(&mut mock, |m| m.read(0))
        .with_any::<u64>(0)
        .and_answer(|args| {
            let sector = *args.get::<u64>(0).unwrap();
            Ok(vec![sector as u8; 2])
        })
        .any_times();
    replay(&mock);
    assert_eq!(Ok(vec![7, 7]), mock.read(7));
    assert_eq!(Ok(vec![9, 9]), mock.read(9));
    verify(&mock);
}

#[test]
fn and_answer_keeps_state() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let mut mock = create_mock::<MockDisk>();
    expect(&mut mock, |m| m.free())
        .and_answer(move |_| {
            1000 - 10 * counter.fetch_add(1, Ordering::Relaxed) as u64
        })
        .times(3, 3);
    replay(&mock);
    assert_eq!(1000, mock.free());
    assert_eq!(990, mock.free());
    assert_eq!(980, mock.free());
    assert_eq!(3, calls.load(Ordering::Relaxed));
    verify(&mock);
}

/// Answers that aren't Send
#[test]
fn and_answer_st() {
    let free = Rc::new(Cell::new(64u64));
    let shared = free.clone();
    let mut mock = create_mock::<MockDisk>();
    expect(&mut mock, |m| m.free())
        .and_answer_st(move |_| shared.get())
        .any_times();
    replay(&mock);
    assert_eq!(64, mock.free());
    free.set(32);
    assert_eq!(32, mock.free());
    verify(&mock);
}

#[test]
#[should_panic(expected = "Unexpected call Disk.free()")]
fn answer_used_up() {
    let mut mock = create_mock::<MockDisk>();
    expect(&mut mock, |m| m.free()).and_answer(|_| 5);
    replay(&mock);
    mock.free();
    mock.free();
}

#[test]
fn stub_return() {
    let mut mock = create_mock::<MockDisk>();
    expect(&mut mock, |m| m.free()).and_return(1).times(1, 1);
    expect(&mut mock, |m| m.free()).and_stub_return(0);
    replay(&mock);
    // Ordinary expectations come first, then the stub takes over
    assert_eq!(1, mock.free());
    assert_eq!(0, mock.free());
    assert_eq!(0, mock.free());
    verify(&mock);
}

#[test]
fn unused_stub_verifies() {
    let mut mock = create_strict_mock::<MockDisk>();
    expect(&mut mock, |m| m.read(1)).and_stub_return(Ok(Vec::new()));
    replay(&mock);
    verify(&mock);
}

#[test]
fn later_response_replaces_earlier() {
    let mut mock = create_mock::<MockDisk>();
    expect(&mut mock, |m| m.free())
        .and_return(1)
        .and_return(2);
    replay(&mock);
    assert_eq!(2, mock.free());
    verify(&mock);
}

/// Independent mocks may live on different threads
#[test]
fn send_to_another_thread() {
    let mut mock = create_mock::<MockDisk>();
    expect(&mut mock, |m| m.free()).and_return(77);
    replay(&mock);
    let mock = thread::spawn(move || {
        assert_eq!(77, mock.free());
        mock
    }).join().unwrap();
    verify(&mock);
}

/// An answer may call other methods of its own mock
#[test]
fn answer_calls_its_own_mock() {
    let slot = Arc::new(OnceLock::<MockMath>::new());
    let inner = slot.clone();
    let mut mock = create_mock::<MockMath>();
    expect(&mut mock, |m| m.one()).and_return(1).any_times();
    expect(&mut mock, |m| m.fact(0))
        .with_any::<u64>(0)
        .and_answer(move |args| {
            *args.get::<u64>(0).unwrap() + inner.get().unwrap().one()
        });
    replay(&mock);
    slot.set(mock).unwrap();
    let mock = slot.get().unwrap();
    assert_eq!(5, mock.fact(4));
    verify(mock);
}

/// An answer can't run while it's already running
#[test]
#[should_panic(expected = "the response for Math.fact called itself \
                           recursively")]
fn answer_calls_itself() {
    let slot = Arc::new(OnceLock::<MockMath>::new());
    let inner = slot.clone();
    let mut mock = create_mock::<MockMath>();
    expect(&mut mock, |m| m.fact(0))
        .with_any::<u64>(0)
        .and_answer(move |args| {
            let n = *args.get::<u64>(0).unwrap();
            if n == 0 {
                1
            } else {
                n * inner.get().unwrap().fact(n - 1)
            }
        })
        .any_times();
    replay(&mock);
    slot.set(mock).unwrap();
    slot.get().unwrap().fact(3);
}

/// A call whose return value couldn't be produced isn't counted
#[test]
fn failed_clone_is_not_counted() {
    let (mut mock, control) =
        create_stand_in::<MockVault>(BehaviorMode::Default, None).unwrap();
    expect(&mut mock, |m| m.token()).and_return(Token(7));
    replay(&mock);
    FAIL_NEXT_CLONE.store(true, Ordering::SeqCst);
    let r = catch_unwind(AssertUnwindSafe(|| mock.token()));
    assert!(r.is_err());
    control.verify_recording().unwrap_err();

    assert_eq!(Token(7), mock.token());
    control.verify().unwrap();
}

/// A response whose value panics while being replaced leaves the control
/// usable
#[test]
fn panic_while_replacing_a_response() {
    let (mut mock, control) =
        create_stand_in::<MockPanel>(BehaviorMode::Default, None).unwrap();
    let mut builder = expect(&mut mock, |m| m.fuse());
    builder.and_return(Fuse(1)).any_times();
    FAIL_NEXT_DROP.store(true, Ordering::SeqCst);
    let r = catch_unwind(AssertUnwindSafe(|| {
        builder.and_return(Fuse(2));
    }));
    assert!(r.is_err());
    expect(&mut mock, |m| m.volts()).and_return(230);
    control.replay().unwrap();
    assert_eq!(230, mock.volts());
    control.verify().unwrap();
}
