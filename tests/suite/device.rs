//! End-to-end behavior of the device surface.

use std::sync::Arc;
use std::thread;

use keystack_core::{Device, EndpointFileRegistrar, Registrar};
use keystack_types::{Capacity, DeviceError, ReadOutcome, StackFull};

use crate::common::{KEY, attached_device, device, drain, push_all};

#[test]
fn lifo_order_through_the_device() {
    let device = attached_device(16);
    push_all(&device, [4, -8, 15, 16, -23, 42]);
    assert_eq!(drain(&device), vec![42, -23, 16, 15, -8, 4]);
    assert_eq!(device.handle_read(), Ok(ReadOutcome::Empty));
}

#[test]
fn full_stack_keeps_prior_values() {
    let device = attached_device(3);
    push_all(&device, [1, 2, 3]);
    assert_eq!(
        device.handle_write(b"4"),
        Err(DeviceError::Full(StackFull { capacity: 3 }))
    );
    let snapshot = device.snapshot();
    assert_eq!(snapshot.top(), 3);
    assert_eq!(snapshot.values, vec![1, 2, 3]);
}

#[test]
fn shrink_discards_values_above_new_capacity() {
    let device = attached_device(5);
    push_all(&device, [1, 2, 3, 4, 5]);
    device.handle_configure(3).expect("shrink");
    assert_eq!(drain(&device), vec![3, 2, 1]);
    assert_eq!(device.handle_read(), Ok(ReadOutcome::Empty));
}

#[test]
fn grow_preserves_and_extends() {
    let device = attached_device(2);
    push_all(&device, [1, 2]);
    device.handle_configure(10).expect("grow");
    push_all(&device, 3..=10);
    assert_eq!(drain(&device), (1..=10).rev().collect::<Vec<_>>());
}

#[test]
fn invalid_configure_leaves_state_unchanged() {
    let device = attached_device(4);
    push_all(&device, [7]);
    let before = device.snapshot();
    for size in [0, -5] {
        assert_eq!(
            device.handle_configure(size),
            Err(DeviceError::InvalidSize { requested: size })
        );
    }
    assert_eq!(device.snapshot(), before);
}

#[test]
fn absent_gate_refuses_every_operation() {
    let device = device(4);
    let before = device.snapshot();
    assert_eq!(device.handle_open(), Err(DeviceError::NotAuthorized));
    assert_eq!(device.handle_read(), Err(DeviceError::NotAuthorized));
    assert_eq!(device.handle_write(b"1"), Err(DeviceError::NotAuthorized));
    assert_eq!(device.handle_configure(2), Err(DeviceError::NotAuthorized));
    assert_eq!(device.snapshot(), before);
}

#[test]
fn many_writers_then_drain_counts_every_value() {
    const THREADS: i32 = 8;
    const PER_THREAD: i32 = 250;
    let device = Arc::new(attached_device(i64::from(THREADS * PER_THREAD)));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let device = Arc::clone(&device);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    let value = (t * PER_THREAD + i).to_string();
                    device.handle_write(value.as_bytes()).expect("write");
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("writer thread");
    }

    let mut values = drain(&device);
    assert_eq!(values.len(), (THREADS * PER_THREAD) as usize);
    values.sort_unstable();
    assert_eq!(values, (0..THREADS * PER_THREAD).collect::<Vec<_>>());
}

#[test]
fn resize_races_with_pushes_without_corruption() {
    let device = attached_device(4);
    thread::scope(|scope| {
        scope.spawn(|| {
            for i in 0..1_000 {
                let _ = device.handle_write(i.to_string().as_bytes());
            }
        });
        scope.spawn(|| {
            for round in 0..200 {
                let size = if round % 2 == 0 { 64 } else { 8 };
                device.handle_configure(size).expect("resize");
            }
        });
    });

    let snapshot = device.snapshot();
    assert!(snapshot.top() <= snapshot.capacity.get());
    // Values are pushed in increasing order, so survivors stay strictly increasing.
    assert!(snapshot.values.windows(2).all(|pair| pair[0] < pair[1]));
}

#[test]
fn endpoint_file_follows_the_gate() {
    let dir = tempfile::tempdir().expect("tempdir");
    let registrar = EndpointFileRegistrar::new(dir.path().join("run"));
    let endpoint = registrar.endpoint_path("int_stack");
    let device = Device::new(
        Capacity::DEFAULT,
        "int_stack",
        Box::new(registrar) as Box<dyn Registrar>,
    );

    assert!(!endpoint.exists());
    device.on_attach(KEY).expect("attach");
    assert!(endpoint.exists());
    device.on_detach(KEY);
    assert!(!endpoint.exists());

    device.on_attach(KEY).expect("reattach");
    device.shutdown();
    assert!(!endpoint.exists());
}
