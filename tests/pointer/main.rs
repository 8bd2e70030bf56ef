use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use normalized_cache::{create_reference_counted_pointer, DisposeError, ReferenceCountedPointer};

fn counted_pointer(item: &'static str) -> (Arc<AtomicUsize>, ReferenceCountedPointer<&'static str>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let observed = Arc::clone(&calls);
    let pointer = create_reference_counted_pointer(item, move || {
        observed.fetch_add(1, Ordering::SeqCst);
    });
    (calls, pointer)
}

/// Root, two children cloned from it, and a second level under each child,
/// with one more clone joining below the left branch.
fn dag(root: ReferenceCountedPointer<&'static str>) -> Vec<ReferenceCountedPointer<&'static str>> {
    let left = root.clone_if_not_disposed().unwrap();
    let right = root.clone_if_not_disposed().unwrap();
    let left_leaf = left.clone_if_not_disposed().unwrap();
    let right_leaf = right.clone_if_not_disposed().unwrap();
    let join = left_leaf.clone_if_not_disposed().unwrap();
    vec![root, left, right, left_leaf, right_leaf, join]
}

#[test]
fn dag_tears_down_once_in_every_ordering() {
    let orderings: [(&str, [usize; 6]); 5] = [
        ("fifo", [0, 1, 2, 3, 4, 5]),
        ("lifo", [5, 4, 3, 2, 1, 0]),
        ("mixed", [2, 5, 0, 3, 1, 4]),
        ("fan_out_first", [0, 1, 2, 5, 3, 4]),
        ("fan_in_first", [5, 3, 4, 1, 2, 0]),
    ];

    for (name, order) in orderings {
        let (calls, root) = counted_pointer("item");
        let mut handles = dag(root);

        for (step, &index) in order.iter().enumerate() {
            assert_eq!(calls.load(Ordering::SeqCst), 0, "{}: torn down before step {}", name, step);
            handles[index].dispose().unwrap();
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1, "{}: teardown count", name);
    }
}

#[test]
fn structural_sharing_across_states() {
    let (calls, mut state_one) = counted_pointer("response");

    // Move to state two while keeping the item alive.
    let mut state_two = state_one.clone_if_not_disposed().unwrap();
    state_one.dispose().unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(state_one.get_item().is_none());
    assert_eq!(state_two.get_item().as_deref(), Some(&"response"));

    state_two.dispose().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn double_dispose_is_reported() {
    let (calls, mut pointer) = counted_pointer("item");
    let mut other = pointer.clone_if_not_disposed().unwrap();

    pointer.dispose().unwrap();
    assert_eq!(pointer.dispose(), Err(DisposeError::AlreadyDisposed));

    // The failed second dispose must not have released the sibling's share.
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    other.dispose().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn disposed_handles_clone_to_none() {
    let (_, mut pointer) = counted_pointer("item");
    let sibling = pointer.clone_if_not_disposed().unwrap();
    pointer.dispose().unwrap();

    assert!(pointer.clone_if_not_disposed().is_none());
    assert!(sibling.clone_if_not_disposed().is_some());
}

#[test]
fn dropping_handles_releases_them() {
    let (calls, pointer) = counted_pointer("item");
    {
        let _handles = dag(pointer);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn handles_move_across_threads() {
    let (calls, pointer) = counted_pointer("item");
    let handles = dag(pointer);

    let threads: Vec<_> = handles
        .into_iter()
        .map(|mut handle| {
            std::thread::spawn(move || {
                assert_eq!(handle.get_item().as_deref(), Some(&"item"));
                handle.dispose().unwrap();
            })
        })
        .collect();
    for thread in threads {
        thread.join().unwrap();
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
