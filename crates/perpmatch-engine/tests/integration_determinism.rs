//! Integration test: deterministic matching and encoding
//!
//! The same resting book must produce the same quote, the same fills, and
//! byte-identical settlement instructions regardless of the order in which
//! orders reached the store. The canonical account list likewise must not
//! depend on leg insertion order.

use perpmatch_engine::{MemoryOrderStore, MemoryTradeStore, OrderBookService};
use perpmatch_feed::EventBus;
use perpmatch_settlement::FakeSettlementClient;
use perpmatch_types::{Address, EngineConfig, FeedConfig, Order, Side};
use rand::seq::SliceRandom;
use rust_decimal::Decimal;

type Service = OrderBookService<MemoryOrderStore, MemoryTradeStore, FakeSettlementClient>;

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

fn service_with(operator: &str) -> Service {
    let config = EngineConfig {
        operator: Address::new(operator),
        ..EngineConfig::default()
    };
    OrderBookService::new(
        config,
        MemoryOrderStore::new(),
        MemoryTradeStore::new(),
        FakeSettlementClient::new(),
    )
}

#[test]
fn insertion_order_never_changes_the_outcome() {
    // One fixed set of asks at distinct prices; the second service gets
    // them shuffled.
    let asks: Vec<Order> = [(99, 3), (101, 4), (98, 2), (103, 6), (100, 5)]
        .into_iter()
        .map(|(price, amount)| Order::dummy_limit(Side::Sell, dec(price), dec(amount)))
        .collect();
    let mut shuffled = asks.clone();
    shuffled.shuffle(&mut rand::thread_rng());

    let incoming = Order::dummy_limit(Side::Buy, dec(101), dec(9));

    let mut first = service_with("0xffff000000000000000000000000000000000001");
    let mut second = service_with("0xffff000000000000000000000000000000000001");
    for order in asks {
        first.add_order(order, Decimal::ZERO);
    }
    for order in shuffled {
        second.add_order(order, Decimal::ZERO);
    }

    let quote_a = first.quote(dec(9), Side::Buy);
    let quote_b = second.quote(dec(9), Side::Buy);
    assert_eq!(quote_a, quote_b);
    assert!(quote_a.fulfilled);

    let mut bus = EventBus::new(FeedConfig::default());
    let out_a = first.fulfill_order(&incoming, &mut bus).unwrap();
    let out_b = second.fulfill_order(&incoming, &mut bus).unwrap();
    assert_eq!(out_a, out_b);

    let subs_a = first.settlement().submissions();
    let subs_b = second.settlement().submissions();
    assert_eq!(subs_a[0].accounts, subs_b[0].accounts);
    assert_eq!(subs_a[0].legs, subs_b[0].legs);
}

#[test]
fn account_indexes_follow_the_sorted_list_not_insertion() {
    let mut svc = service_with("0xffffffffffffffffffffffffffffffffffffffff");
    let maker_c = Address::new("0xcccccccccccccccccccccccccccccccccccccccc");
    let maker_a = Address::new("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    let maker_b = Address::new("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");

    // Priced so the plan touches them as C, A, B.
    svc.add_order(
        Order::dummy_limit_for_maker(maker_c.clone(), Side::Sell, dec(99), dec(1)),
        Decimal::ZERO,
    );
    svc.add_order(
        Order::dummy_limit_for_maker(maker_a.clone(), Side::Sell, dec(100), dec(1)),
        Decimal::ZERO,
    );
    svc.add_order(
        Order::dummy_limit_for_maker(maker_b.clone(), Side::Sell, dec(101), dec(1)),
        Decimal::ZERO,
    );

    let taker = Address::new("0xdddddddddddddddddddddddddddddddddddddddd");
    let incoming = Order::dummy_limit_for_maker(taker.clone(), Side::Buy, dec(101), dec(3));
    let mut bus = EventBus::new(FeedConfig::default());
    let outcome = svc.fulfill_order(&incoming, &mut bus).unwrap();
    assert!(outcome.is_fulfilled);

    let submissions = svc.settlement().submissions();
    let submission = &submissions[0];
    assert_eq!(
        submission.accounts,
        vec![
            maker_a,
            maker_b,
            maker_c,
            taker,
            svc.config().operator.clone()
        ]
    );

    // Legs alternate maker-side / incoming-side in plan order C, A, B.
    let maker_indexes: Vec<usize> = submission.legs.iter().map(|l| l.maker_index).collect();
    assert_eq!(maker_indexes, vec![2, 3, 0, 3, 1, 3]);
    assert!(submission.legs.iter().all(|l| l.taker_index == 4));
}
