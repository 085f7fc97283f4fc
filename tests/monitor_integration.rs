// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the running monitor using the mock GPIO backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use dakota_motion::gpio::MockGpio;
use dakota_motion::types::{Edge, Pull};
use dakota_motion::{
    ChangeEvent, GpioChip, MonitorConfig, MonitorHandle, MonitorState, MotionMonitor,
    PinNumbering, PlatformConfig, PollInterval, ReadError, Subscribable,
};
use parking_lot::Mutex;

fn interval(ms: u64) -> PollInterval {
    PollInterval::from_millis(ms).unwrap()
}

fn start(gpio: &Arc<MockGpio>, pin: u8, ms: u64) -> (GpioChip, MotionMonitor) {
    let chip = GpioChip::bcm(gpio.clone());
    let monitor = MotionMonitor::new(chip.claim(pin).unwrap(), interval(ms));
    (chip, monitor)
}

fn recorder(monitor: &impl Subscribable) -> Arc<Mutex<Vec<ChangeEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    monitor.subscribe(move |event| sink.lock().push(event.clone()));
    events
}

fn values(events: &Mutex<Vec<ChangeEvent>>) -> Vec<bool> {
    events.lock().iter().map(ChangeEvent::value).collect()
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..400 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached within 2s");
}

async fn wait_armed(handle: &MonitorHandle) {
    wait_until(|| handle.state().is_armed()).await;
}

// ============================================================================
// Change Detection Tests
// ============================================================================

mod change_detection {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn three_high_samples_emit_one_event() {
        let gpio = Arc::new(MockGpio::new());
        gpio.push_reads(17, [false, true, true, true]);
        let (_chip, monitor) = start(&gpio, 17, 10);
        let events = recorder(&monitor);

        let handle = monitor.start();
        wait_until(|| gpio.read_calls() >= 8).await;
        handle.stop();

        let events = events.lock();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].pin(), 17);
        assert!(events[0].value());
        assert_eq!(events[0].sequence(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn emits_on_every_difference() {
        let gpio = Arc::new(MockGpio::new());
        gpio.push_reads(17, [false, false, true, true, false]);
        let (_chip, monitor) = start(&gpio, 17, 10);
        let events = recorder(&monitor);

        let handle = monitor.start();
        wait_until(|| gpio.read_calls() >= 8).await;
        handle.stop();

        assert_eq!(values(&events), vec![true, false]);
        assert!(!handle.stable_state());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn initial_state_suppresses_first_event() {
        let gpio = Arc::new(MockGpio::new());
        gpio.set_level(17, true);
        let (_chip, monitor) = start(&gpio, 17, 10);
        let monitor = monitor.with_initial_state(true);
        let events = recorder(&monitor);

        let handle = monitor.start();
        wait_until(|| gpio.read_calls() >= 3).await;
        handle.stop();

        assert!(events.lock().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn events_are_broadcast_to_async_receivers() {
        let gpio = Arc::new(MockGpio::new());
        let chip = GpioChip::bcm(gpio.clone());
        let handle = MotionMonitor::start_with(&chip, 27, interval(10)).unwrap();
        let mut rx = handle.events();
        wait_armed(&handle).await;

        gpio.set_level(27, true);
        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.line(), 27);
        assert!(event.value());

        handle.stop();
    }
}

// ============================================================================
// Subscriber Tests
// ============================================================================

mod subscribers {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn all_subscribers_see_same_order() {
        let gpio = Arc::new(MockGpio::new());
        gpio.push_reads(17, [true, false, true, false]);
        let (_chip, monitor) = start(&gpio, 17, 10);

        let log = Arc::new(Mutex::new(Vec::new()));
        for name in ["first", "second", "third"] {
            let log = Arc::clone(&log);
            monitor.subscribe(move |event| log.lock().push((event.sequence(), name)));
        }

        let handle = monitor.start();
        wait_until(|| log.lock().len() == 12).await;
        handle.stop();

        let expected: Vec<(u64, &str)> = (1..=4)
            .flat_map(|seq| [(seq, "first"), (seq, "second"), (seq, "third")])
            .collect();
        assert_eq!(*log.lock(), expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn failing_subscribers_are_isolated() {
        let gpio = Arc::new(MockGpio::new());
        let (_chip, monitor) = start(&gpio, 17, 10);

        monitor.subscribe_fallible(|_| Err::<(), _>("homekit unreachable"));
        monitor.subscribe(|_| panic!("subscriber bug"));
        let events = recorder(&monitor);

        let handle = monitor.start();
        wait_armed(&handle).await;

        gpio.set_level(17, true);
        wait_until(|| events.lock().len() == 1).await;
        gpio.set_level(17, false);
        wait_until(|| events.lock().len() == 2).await;

        assert_eq!(handle.stats().callback_failures, 4);
        assert!(handle.is_running());
        handle.stop();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn subscribing_after_start() {
        let gpio = Arc::new(MockGpio::new());
        let chip = GpioChip::bcm(gpio.clone());
        let handle = MotionMonitor::start_with(&chip, 17, interval(10)).unwrap();
        let events = recorder(&handle);
        wait_armed(&handle).await;

        gpio.set_level(17, true);
        wait_until(|| events.lock().len() == 1).await;
        handle.stop();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unsubscribed_callback_is_not_called() {
        let gpio = Arc::new(MockGpio::new());
        let (_chip, monitor) = start(&gpio, 17, 10);

        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let id = monitor.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let events = recorder(&monitor);

        let handle = monitor.start();
        assert!(handle.unsubscribe(id));
        wait_armed(&handle).await;

        gpio.set_level(17, true);
        wait_until(|| events.lock().len() == 1).await;
        handle.stop();

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn slow_subscriber_does_not_stall_ticks() {
        let gpio = Arc::new(MockGpio::new());
        let (_chip, monitor) = start(&gpio, 17, 10);
        monitor.subscribe(|_| std::thread::sleep(Duration::from_millis(300)));

        let handle = monitor.start();
        wait_armed(&handle).await;
        gpio.set_level(17, true);
        wait_until(|| handle.stats().events_emitted == 1).await;

        let ticks = handle.stats().ticks;
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.stats().ticks >= ticks + 3);

        handle.stop();
    }
}

// ============================================================================
// Recovery Tests
// ============================================================================

mod recovery {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn read_error_reconfigures_and_resumes() {
        let gpio = Arc::new(MockGpio::new());
        gpio.push_reads(17, [false]);
        gpio.push_read_error(
            17,
            ReadError::Io {
                line: 17,
                message: "bus busy".to_string(),
            },
        );
        gpio.push_reads(17, [true]);
        let (_chip, monitor) = start(&gpio, 17, 10);
        let events = recorder(&monitor);

        let handle = monitor.start();
        wait_until(|| events.lock().len() == 1).await;
        handle.stop();

        let stats = handle.stats();
        assert_eq!(stats.read_failures, 1);
        assert_eq!(stats.configure_attempts, 2);
        assert_eq!(gpio.configure_calls(), 2);
        assert_eq!(values(&events), vec![true]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn unavailable_pin_is_retried_until_it_appears() {
        let gpio = Arc::new(MockGpio::new());
        gpio.fail_configures(17, 3);
        gpio.set_level(17, true);
        let (_chip, monitor) = start(&gpio, 17, 10);
        let events = recorder(&monitor);

        let handle = monitor.start();
        wait_until(|| events.lock().len() == 1).await;
        handle.stop();

        let stats = handle.stats();
        assert_eq!(stats.configure_failures, 3);
        assert_eq!(stats.configure_attempts, 4);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stuck_read_times_out() {
        let gpio = Arc::new(MockGpio::new());
        gpio.set_read_delay(Some(Duration::from_millis(60)));
        let (_chip, monitor) = start(&gpio, 17, 40);
        let events = recorder(&monitor);

        let handle = monitor.start();
        wait_until(|| handle.stats().read_failures >= 1).await;

        gpio.set_read_delay(None);
        gpio.set_level(17, true);
        wait_until(|| events.lock().len() == 1).await;
        handle.stop();
    }
}

// ============================================================================
// Stop Tests
// ============================================================================

mod stop {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn no_events_after_stop() {
        let gpio = Arc::new(MockGpio::new());
        let (_chip, monitor) = start(&gpio, 17, 10);
        let events = recorder(&monitor);

        let handle = monitor.start();
        wait_armed(&handle).await;
        handle.stop();

        gpio.set_level(17, true);
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert!(events.lock().is_empty());
        assert_eq!(handle.state(), MonitorState::Stopped);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn delayed_read_after_stop_is_discarded() {
        let gpio = Arc::new(MockGpio::new());
        let (_chip, monitor) = start(&gpio, 17, 100);
        let events = recorder(&monitor);

        let handle = monitor.start();
        wait_armed(&handle).await;

        gpio.set_read_delay(Some(Duration::from_millis(40)));
        gpio.set_level(17, true);
        let reads = gpio.read_calls();
        wait_until(|| gpio.read_calls() > reads).await;
        handle.stop();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(events.lock().is_empty());
        assert!(!handle.stable_state());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_from_inside_callback() {
        let gpio = Arc::new(MockGpio::new());
        let (_chip, monitor) = start(&gpio, 17, 10);
        let before = recorder(&monitor);
        let handle = monitor.start();

        let own = handle.clone();
        handle.subscribe(move |_| own.stop());
        let after = recorder(&handle);
        wait_armed(&handle).await;

        gpio.set_level(17, true);
        wait_until(|| !handle.is_running()).await;

        gpio.set_level(17, false);
        tokio::time::sleep(Duration::from_millis(60)).await;

        // The event that triggered the stop still reaches every subscriber.
        assert_eq!(values(&before), vec![true]);
        assert_eq!(values(&after), vec![true]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_waits_for_event_in_delivery() {
        let gpio = Arc::new(MockGpio::new());
        let (_chip, monitor) = start(&gpio, 17, 10);

        let delivered = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&delivered);
        monitor.subscribe(move |_| {
            std::thread::sleep(Duration::from_millis(100));
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let handle = monitor.start();
        wait_armed(&handle).await;
        gpio.set_level(17, true);
        wait_until(|| handle.stats().events_emitted == 1).await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        let stopper = handle.clone();
        tokio::task::spawn_blocking(move || stopper.stop())
            .await
            .unwrap();
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn stop_releases_pin() {
        let gpio = Arc::new(MockGpio::new());
        let chip = GpioChip::bcm(gpio.clone());
        let handle = MotionMonitor::start_with(&chip, 17, interval(10)).unwrap();
        wait_armed(&handle).await;

        assert!(MotionMonitor::start_with(&chip, 17, interval(10)).is_err());

        handle.stop();
        wait_until(|| !chip.is_claimed(17)).await;
        let again = MotionMonitor::start_with(&chip, 17, interval(10)).unwrap();
        again.stop();
    }
}

// ============================================================================
// Configuration Tests
// ============================================================================

mod configuration {
    use super::*;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn from_json_with_board_numbering() {
        let gpio = Arc::new(MockGpio::new());
        let chip = GpioChip::new(gpio.clone(), PinNumbering::Board);
        let config = MonitorConfig::from_json(
            r#"{ "name": "Driveway", "pin": 11, "numbering": "board", "intervalMs": 10 }"#,
        )
        .unwrap();

        let monitor = MotionMonitor::from_config(&chip, &config).unwrap();
        let events = recorder(&monitor);
        let handle = monitor.start();
        wait_armed(&handle).await;

        let applied = gpio.configuration(17).unwrap();
        assert_eq!(applied.edge(), Edge::Both);
        assert_eq!(applied.pull(), Pull::Down);

        gpio.set_level(17, true);
        wait_until(|| events.lock().len() == 1).await;
        handle.stop();

        let event = events.lock()[0].clone();
        assert_eq!(event.pin(), 11);
        assert_eq!(event.line(), 17);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn platform_block_starts_each_sensor() {
        let gpio = Arc::new(MockGpio::new());
        let chip = GpioChip::bcm(gpio.clone());
        let platform = PlatformConfig::from_json(
            r#"{
                "platform": "DakotaMotionSensors",
                "devices": [
                    { "name": "Driveway", "pin": 17, "intervalMs": 10 },
                    { "name": "Gate", "pin": 27, "intervalMs": 10 }
                ]
            }"#,
        )
        .unwrap();

        let handles: Vec<MonitorHandle> = platform
            .sensors
            .iter()
            .map(|config| MotionMonitor::from_config(&chip, config).unwrap().start())
            .collect();
        for handle in &handles {
            wait_armed(handle).await;
        }

        gpio.set_level(27, true);
        wait_until(|| handles[1].stable_state()).await;
        assert!(!handles[0].stable_state());

        for handle in &handles {
            handle.stop();
        }
    }
}
