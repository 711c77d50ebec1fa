use std::sync::Arc;
use std::thread;

use courier_threading::Monitor;
use criterion::{Criterion, criterion_group, criterion_main};

fn uncontended_lock(c: &mut Criterion) {
    let monitor = Monitor::new(0u64);

    c.bench_function("monitor_uncontended_lock", |b| {
        b.iter(|| {
            *monitor.lock() += 1;
        })
    });
}

// Phases of the ping-pong protocol between the bench thread and the echo thread.
const IDLE: u8 = 0;
const PING: u8 = 1;
const PONG: u8 = 2;
const SHUTDOWN: u8 = 3;

fn notify_round_trip(c: &mut Criterion) {
    let state = Arc::new(Monitor::new(IDLE));

    let echo = {
        let state = Arc::clone(&state);
        thread::spawn(move || {
            loop {
                let mut phase = state.lock();
                while *phase != PING && *phase != SHUTDOWN {
                    phase.wait();
                }
                if *phase == SHUTDOWN {
                    break;
                }
                *phase = PONG;
                phase.notify_all();
            }
        })
    };

    c.bench_function("monitor_notify_round_trip", |b| {
        b.iter(|| {
            let mut phase = state.lock();
            *phase = PING;
            phase.notify_all();
            while *phase != PONG {
                phase.wait();
            }
            *phase = IDLE;
        })
    });

    {
        let mut phase = state.lock();
        *phase = SHUTDOWN;
        phase.notify_all();
    }
    echo.join().unwrap();
}

criterion_group!(benches, uncontended_lock, notify_round_trip);
criterion_main!(benches);
