//! Many generators sharing one state directory and one authority.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::Utc;

use vmid_gen::adapters::{FixedClock, InMemoryAuthority};
use vmid_gen::{CallContext, Generator, GeneratorConfig};

const THREADS: usize = 8;
const PER_THREAD: usize = 5;

fn spawn_allocators(config: &GeneratorConfig, authority: &Arc<InMemoryAuthority>) -> Vec<u32> {
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let config = config.clone();
            let authority = Arc::clone(authority);
            thread::spawn(move || {
                let generator =
                    Generator::new(config, Box::new(authority), &FixedClock(Utc::now())).unwrap();
                (0..PER_THREAD)
                    .map(|_| generator.next_id(&CallContext::background()).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    handles.into_iter().flat_map(|h| h.join().unwrap()).collect()
}

#[test]
fn sequential_generators_hand_out_a_gapless_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = GeneratorConfig::in_dir(dir.path()).retry_delay(Duration::from_millis(5));
    let authority = Arc::new(InMemoryAuthority::new());

    let mut ids = spawn_allocators(&config, &authority);
    ids.sort_unstable();

    let total = u32::try_from(THREADS * PER_THREAD).unwrap();
    assert_eq!(ids, (100..100 + total).collect::<Vec<_>>());
    assert_eq!(
        std::fs::read_to_string(&config.sequence_path).unwrap(),
        (99 + total).to_string()
    );
}

#[test]
fn random_generators_never_repeat_and_skip_the_store() {
    let dir = tempfile::tempdir().unwrap();
    let config = GeneratorConfig::in_dir(dir.path())
        .random(true)
        .range(1_000, 2_000)
        .retry_delay(Duration::from_millis(5));
    let authority = Arc::new(InMemoryAuthority::new());

    let ids = spawn_allocators(&config, &authority);

    let unique: HashSet<_> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());
    assert!(ids.iter().all(|id| (1_000..2_000).contains(id)));
    assert!(!config.sequence_path.exists());
}
