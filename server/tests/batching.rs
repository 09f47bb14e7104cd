//! Outgoing batching: interval flushes, flush-on-full, ordering, and the
//! broken-connection suppression that follows a refused send.

mod support;

use std::time::{Duration, Instant};

use bitnet_server::shared::{BitReader, Channel, Message, UnspawnMessage};

use support::started_server;

fn unspawn(net_id: u64) -> UnspawnMessage {
    UnspawnMessage { net_id }
}

/// Walks a packet and returns the net ids of the unspawn frames in it.
fn decode_unspawn_frames(packet: &[u8]) -> Vec<u64> {
    let mut reader = BitReader::new(packet);
    let mut net_ids = Vec::new();
    while reader.remaining_bits() >= 8 {
        assert_eq!(reader.read_u8_bits(8).unwrap(), UnspawnMessage::ID);
        net_ids.push(reader.read_u64_bits(64).unwrap());
    }
    net_ids
}

#[test]
fn nothing_is_sent_before_the_interval() {
    let (mut server, transport, mut store) = started_server(508);
    let start = Instant::now();

    transport.borrow_mut().connect(1);
    server.tick_at(&mut store, start);

    server
        .context_at(&mut store, start)
        .send(1, &unspawn(5), Channel::Reliable);

    server.tick_at(&mut store, start + Duration::from_millis(9));
    assert_eq!(transport.borrow().total_sent(1), 0);

    server.tick_at(&mut store, start + Duration::from_millis(10));
    assert_eq!(transport.borrow().total_sent(1), 1);
}

#[test]
fn messages_share_one_packet_in_send_order() {
    let (mut server, transport, mut store) = started_server(508);
    let start = Instant::now();

    transport.borrow_mut().connect(1);
    server.tick_at(&mut store, start);

    {
        let mut context = server.context_at(&mut store, start);
        for net_id in [10, 20, 30] {
            assert!(context.send(1, &unspawn(net_id), Channel::Reliable));
        }
    }
    server.tick_at(&mut store, start + Duration::from_millis(10));

    let transport = transport.borrow();
    let packets = transport.sent_packets(1, Channel::Reliable);
    assert_eq!(packets.len(), 1);
    // three 72-bit frames bit-packed: 216 bits = 27 bytes, no filler
    assert_eq!(packets[0].len(), 27);
    assert_eq!(decode_unspawn_frames(&packets[0]), vec![10, 20, 30]);
}

#[test]
fn channels_batch_independently() {
    let (mut server, transport, mut store) = started_server(508);
    let start = Instant::now();

    transport.borrow_mut().connect(1);
    server.tick_at(&mut store, start);

    {
        let mut context = server.context_at(&mut store, start);
        context.send(1, &unspawn(1), Channel::Reliable);
        context.send(1, &unspawn(2), Channel::Unreliable);
    }
    server.tick_at(&mut store, start + Duration::from_millis(10));

    let transport = transport.borrow();
    assert_eq!(transport.sent_packets(1, Channel::Reliable).len(), 1);
    assert_eq!(transport.sent_packets(1, Channel::Unreliable).len(), 1);
}

#[test]
fn full_batches_flush_immediately() {
    // 16-byte packets hold 128 bits: one 72-bit frame fits, two do not
    let (mut server, transport, mut store) = started_server(16);
    let start = Instant::now();

    transport.borrow_mut().connect(1);
    server.tick_at(&mut store, start);

    let mut context = server.context_at(&mut store, start);
    assert!(context.send(1, &unspawn(1), Channel::Reliable));
    assert!(context.send(1, &unspawn(2), Channel::Reliable));
    drop(context);

    // the first frame went out when the second would not fit
    let borrowed = transport.borrow();
    let packets = borrowed.sent_packets(1, Channel::Reliable);
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0].len(), 9);
    assert_eq!(decode_unspawn_frames(&packets[0]), vec![1]);
    drop(borrowed);

    // the second follows on the interval flush, unsplit
    server.tick_at(&mut store, start + Duration::from_millis(10));
    let borrowed = transport.borrow();
    let packets = borrowed.sent_packets(1, Channel::Reliable);
    assert_eq!(packets.len(), 2);
    assert_eq!(decode_unspawn_frames(&packets[1]), vec![2]);
}

#[test]
fn steady_traffic_is_rate_bounded_by_the_interval() {
    let (mut server, transport, mut store) = started_server(508);
    let start = Instant::now();

    transport.borrow_mut().connect(1);
    server.tick_at(&mut store, start);

    // one small message every 2 ms for 100 ms
    for i in 0..50u64 {
        let now = start + Duration::from_millis(i * 2);
        server
            .context_at(&mut store, now)
            .send(1, &unspawn(i), Channel::Unreliable);
        server.tick_at(&mut store, now);
    }
    server.tick_at(&mut store, start + Duration::from_millis(110));

    let transport = transport.borrow();
    let packets = transport.sent_packets(1, Channel::Unreliable);
    // ~one packet per 10 ms interval, not one per message
    assert!(packets.len() <= 11, "sent {} packets", packets.len());

    // every message arrived exactly once, in order
    let mut all = Vec::new();
    for packet in packets {
        assert!(packet.len() <= 508);
        all.extend(decode_unspawn_frames(packet));
    }
    assert_eq!(all, (0..50).collect::<Vec<_>>());
}

#[test]
fn refused_sends_break_the_connection_and_suppress_traffic() {
    let (mut server, transport, mut store) = started_server(508);
    let start = Instant::now();

    transport.borrow_mut().connect(1);
    server.tick_at(&mut store, start);

    server
        .context_at(&mut store, start)
        .send(1, &unspawn(1), Channel::Reliable);
    transport.borrow_mut().fail_sends_to(1);

    // the interval flush fails, marking the connection broken
    server.tick_at(&mut store, start + Duration::from_millis(10));
    assert!(server.connection(1).unwrap().is_broken());
    assert_eq!(transport.borrow().disconnect_requests(), &[1]);

    // further sends are silently dropped, no retry storm
    assert!(!server
        .context_at(&mut store, start + Duration::from_millis(11))
        .send(1, &unspawn(2), Channel::Reliable));

    // the transport confirms and the connection goes away
    server.tick_at(&mut store, start + Duration::from_millis(20));
    assert!(!server.is_connected(1));
}

#[test]
fn sends_to_unknown_connections_are_rejected() {
    let (mut server, _transport, mut store) = started_server(508);
    assert!(!server
        .context(&mut store)
        .send(99, &unspawn(1), Channel::Reliable));
}

#[test]
fn send_many_preserves_order_and_counts() {
    let (mut server, transport, mut store) = started_server(508);
    let start = Instant::now();

    transport.borrow_mut().connect(1);
    server.tick_at(&mut store, start);

    let messages: Vec<_> = (0..5).map(unspawn).collect();
    let sent = server
        .context_at(&mut store, start)
        .send_many(1, &messages, Channel::Reliable);
    assert_eq!(sent, 5);

    server.tick_at(&mut store, start + Duration::from_millis(10));
    let transport = transport.borrow();
    let packets = transport.sent_packets(1, Channel::Reliable);
    assert_eq!(packets.len(), 1);
    assert_eq!(decode_unspawn_frames(&packets[0]), vec![0, 1, 2, 3, 4]);
}
