//! Same-key atomicity with many clients.

mod common;

use common::{init_tracing, run};
use emberkv::{Config, Database, Reply};
use std::time::Duration;

#[test]
fn concurrent_appends_never_lose_updates() {
    let db = common::open_db();
    let a = db.handler();
    let b = db.handler();

    let ta = std::thread::spawn(move || run(&a, &["APPEND", "k", "aaaa"]));
    let tb = std::thread::spawn(move || run(&b, &["APPEND", "k", "bb"]));
    let ra = ta.join().unwrap().as_integer().unwrap();
    let rb = tb.join().unwrap().as_integer().unwrap();

    // Whoever ran second saw the other's bytes
    assert!((ra, rb) == (4, 6) || (ra, rb) == (6, 2), "got {ra}, {rb}");

    let client = db.handler();
    let value = run(&client, &["GET", "k"]);
    let value = value.as_str().unwrap();
    assert!(value == "aaaabb" || value == "bbaaaa", "got {value}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_clients_appending_to_shared_keys() {
    init_tracing();
    let db = Database::open(Config::new().num_shards(4)).unwrap();

    let tasks: Vec<_> = (0..8)
        .map(|client_id| {
            let client = db.handler();
            tokio::spawn(async move {
                for i in 0..200 {
                    let key = format!("key:{}", i % 4);
                    let reply = run(&client, &["APPEND", &key, &format!("{client_id}")]);
                    assert!(reply.as_integer().is_some());
                    if i % 50 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }

    let client = db.handler();
    let mut total = 0;
    for k in 0..4 {
        let len = run(&client, &["STRLEN", &format!("key:{k}")]).as_integer().unwrap();
        total += len;
    }
    assert_eq!(total, 8 * 200);

    // Every client's bytes landed exactly as often as it appended
    for k in 0..4 {
        let value = run(&client, &["GET", &format!("key:{k}")]);
        let value = value.as_bytes().unwrap();
        for client_id in 0..8u8 {
            let count = value.iter().filter(|&&b| b == b'0' + client_id).count();
            assert_eq!(count, 50);
        }
    }
}

#[tokio::test]
async fn sweeper_and_commands_agree_on_expiry() {
    init_tracing();
    let config = Config::new().sweep_interval(Duration::from_millis(10));
    let db = Database::open(config).unwrap();
    let client = db.handler();

    for i in 0..50 {
        run(&client, &["SET", &format!("temp:{i}"), "v", "PX", "20"]);
    }
    run(&client, &["SET", "keep", "v"]);

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(run(&client, &["DBSIZE"]), Reply::integer(1));
    assert_eq!(run(&client, &["TTL", "temp:0"]), Reply::integer(-2));
    assert_eq!(run(&client, &["APPEND", "temp:0", "x"]), Reply::integer(1));
    db.shutdown();
}

#[test]
fn dbsize_matches_live_keys_after_concurrent_flushdb() {
    let db = common::open_db();

    for round in 0..10 {
        let writers: Vec<_> = (0..4)
            .map(|t| {
                let client = db.handler();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        run(&client, &["SET", &format!("r{round}:t{t}:{i}"), "v"]);
                    }
                })
            })
            .collect();

        let client = db.handler();
        assert_eq!(run(&client, &["FLUSHDB"]), Reply::ok());
        for w in writers {
            w.join().unwrap();
        }

        let mut live = 0;
        for t in 0..4 {
            for i in 0..100 {
                let key = format!("r{round}:t{t}:{i}");
                live += run(&client, &["EXISTS", &key]).as_integer().unwrap();
            }
        }
        assert_eq!(run(&client, &["DBSIZE"]), Reply::integer(live), "round {round}");
        assert_eq!(run(&client, &["FLUSHDB"]), Reply::ok());
        assert_eq!(run(&client, &["DBSIZE"]), Reply::integer(0));
    }
}
