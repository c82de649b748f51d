//! Integration test: full order lifecycle
//!
//! REST → CROSS → SETTLE → PERSIST → ANNOUNCE
//!
//! Drives the service end to end with in-memory stores, a fake settlement
//! client, and a recording feed connection.

use perpmatch_engine::{MemoryOrderStore, MemoryTradeStore, OrderBookService, OrderFilter};
use perpmatch_feed::{EventBus, RecordingSink};
use perpmatch_settlement::FakeSettlementClient;
use perpmatch_types::{Address, EngineConfig, FeedConfig, Order, Side};
use rust_decimal::Decimal;

type Service = OrderBookService<MemoryOrderStore, MemoryTradeStore, FakeSettlementClient>;

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn operator() -> Address {
    Address::new("0x00000000000000000000000000000000000fee0d")
}

fn service() -> Service {
    let config = EngineConfig {
        operator: operator(),
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
fn incoming_buy_sweeps_the_book_and_settles_once() {
    init_tracing();
    let mut svc = service();
    let mut bus = EventBus::new(FeedConfig::default());
    let sink = RecordingSink::new();
    let conn = bus.connect(Box::new(sink.clone()));
    bus.handle_message(
        conn,
        r#"{"type":"subscribe","requestId":"ords","channel":"orders"}"#,
        &svc,
    )
    .unwrap();
    bus.handle_message(
        conn,
        r#"{"type":"subscribe","requestId":"fills","channel":"tradeHistory"}"#,
        &svc,
    )
    .unwrap();

    // Two resting asks from two makers: 3 @ 99 and 4 @ 101.
    let maker_a = Address::new("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    let maker_b = Address::new("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");
    let (cheap, out) = svc
        .submit_order(
            Order::dummy_limit_for_maker(maker_a.clone(), Side::Sell, dec(99), dec(3)),
            &mut bus,
        )
        .unwrap();
    assert_eq!(out.filled_amount, Decimal::ZERO);
    svc.submit_order(
        Order::dummy_limit_for_maker(maker_b.clone(), Side::Sell, dec(101), dec(4)),
        &mut bus,
    )
    .unwrap();

    // Incoming buy of 5 limited to 100 can only cross the cheap ask.
    let taker = Address::new("0xcccccccccccccccccccccccccccccccccccccccc");
    let (resting, outcome) = svc
        .submit_order(
            Order::dummy_limit_for_maker(taker.clone(), Side::Buy, dec(100), dec(5)),
            &mut bus,
        )
        .unwrap();
    assert_eq!(outcome.filled_amount, dec(3));
    assert!(!outcome.is_fulfilled);
    assert_eq!(resting.filled_amount, dec(3));

    // One settlement transaction, two legs (maker side + incoming side),
    // sent by the operator, with the operator as taker on both legs.
    let submissions = svc.settlement().submissions();
    assert_eq!(submissions.len(), 1);
    let submission = &submissions[0];
    assert_eq!(submission.sender, operator());
    assert_eq!(submission.legs.len(), 2);
    for pair in submission.accounts.windows(2) {
        assert!(pair[0] < pair[1], "account list must be sorted");
    }
    for leg in &submission.legs {
        assert_eq!(submission.accounts[leg.taker_index], operator());
        assert!(leg.maker_index < submission.accounts.len());
    }

    // The maker order carries its fill; the incoming rests with the rest.
    assert_eq!(svc.get_order(&cheap.hash).unwrap().filled_amount, dec(3));
    assert_eq!(svc.get_order(&resting.hash).unwrap().remaining(), dec(2));

    // Trade history: one maker row plus one aggregate, sharing a tx hash.
    let history = svc.trade_history(1, 10);
    assert_eq!(history.total, 2);
    let maker_row = &history.records[0];
    let aggregate = &history.records[1];
    assert_eq!(maker_row.tx_hash, aggregate.tx_hash);
    assert_eq!(maker_row.maker, maker_a);
    assert!(maker_row.taker.is_zero());
    assert_eq!(maker_row.side, Side::Sell);
    assert_eq!(maker_row.amount, dec(3));
    assert_eq!(maker_row.price, dec(99));
    assert!(aggregate.maker.is_zero());
    assert_eq!(aggregate.taker, taker);
    assert_eq!(aggregate.side, Side::Buy);
    assert_eq!(aggregate.price, dec(99));

    // Both trade rows arrive in a single coalesced update frame, after the
    // empty backfill the subscription started with.
    let frames = sink.sent_json();
    let fill_updates: Vec<_> = frames
        .iter()
        .filter(|frame| frame["type"] == "update" && frame["requestId"] == "fills")
        .collect();
    assert_eq!(fill_updates.len(), 2);
    assert!(fill_updates[0]["payload"].as_array().unwrap().is_empty());
    assert_eq!(fill_updates[1]["payload"].as_array().unwrap().len(), 2);

    // The orders subscription saw its backfill, each resting announcement,
    // the maker's fill, and the incoming order's own announcement.
    let order_updates: Vec<_> = frames
        .iter()
        .filter(|frame| frame["type"] == "update" && frame["requestId"] == "ords")
        .collect();
    assert_eq!(order_updates.len(), 5);
    assert!(order_updates[0]["payload"].as_array().unwrap().is_empty());
    let last = order_updates.last().unwrap();
    assert_eq!(last["payload"][0]["hash"], resting.hash.to_string());
}

#[test]
fn order_book_view_reflects_freshness_not_fill_state() {
    let mut svc = service();
    let mut bus = EventBus::new(FeedConfig::default());

    svc.submit_order(Order::dummy_limit(Side::Sell, dec(99), dec(3)), &mut bus)
        .unwrap();
    svc.submit_order(Order::dummy_limit(Side::Sell, dec(101), dec(4)), &mut bus)
        .unwrap();
    // Sweeps the cheap ask completely; it stays visible until it expires.
    svc.submit_order(Order::dummy_limit(Side::Buy, dec(100), dec(3)), &mut bus)
        .unwrap();

    let view = svc.order_book(1, 10);
    let ask_prices: Vec<Decimal> = view
        .asks
        .records
        .iter()
        .map(|r| r.order.limit_price)
        .collect();
    assert_eq!(ask_prices, vec![dec(99), dec(101)]);
    assert_eq!(view.asks.records[0].remaining(), Decimal::ZERO);
    // The fully crossed incoming order was persisted too.
    assert_eq!(view.bids.total, 1);
    assert_eq!(view.bids.records[0].remaining(), Decimal::ZERO);
}

#[test]
fn queries_see_a_trader_on_either_side_of_an_order() {
    let mut svc = service();
    let alice = Address::new("0xa11ce00000000000000000000000000000000000");

    let mut by_alice = Order::dummy_limit(Side::Buy, dec(100), dec(1));
    by_alice.maker = alice.clone();
    let mut at_alice = Order::dummy_limit(Side::Sell, dec(105), dec(1));
    at_alice.taker = alice.clone();
    svc.add_order(by_alice, Decimal::ZERO);
    svc.add_order(at_alice, Decimal::ZERO);
    svc.add_order(Order::dummy_limit(Side::Sell, dec(110), dec(1)), Decimal::ZERO);

    let filter = OrderFilter {
        trader: Some(alice),
        ..OrderFilter::default()
    };
    let page = svc.orders(filter, 1, 10);
    assert_eq!(page.total, 2);
    assert_eq!(svc.orders(OrderFilter::default(), 1, 10).total, 3);
}

#[test]
fn cancelling_the_remainder_empties_the_bid_side() {
    let mut svc = service();
    let mut bus = EventBus::new(FeedConfig::default());

    let (record, _) = svc
        .submit_order(Order::dummy_limit(Side::Buy, dec(100), dec(5)), &mut bus)
        .unwrap();
    assert_eq!(svc.order_book(1, 10).bids.total, 1);

    svc.cancel_orders(&[record.hash], &mut bus);
    svc.cancel_orders(&[record.hash], &mut bus); // second pass finds nothing

    assert_eq!(svc.order_book(1, 10).bids.total, 0);
    assert_eq!(svc.orders(OrderFilter::default(), 1, 10).total, 0);
}
