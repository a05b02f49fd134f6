//! Loopback integration test: a fake transmitter socket talks to a real
//! relay hub over UDP on 127.0.0.1.

use std::net::UdpSocket;
use std::time::{Duration, Instant};

use rclink_proto::{ControlPacket, Encode, TelemetryPacket};
use rclink_relay::{RelayConfig, RelayError, RelayHub};

fn test_hub(disable_ms: u64, delete_ms: u64) -> RelayHub {
    RelayHub::bind(RelayConfig {
        listen_port: 0,
        disable_after: Duration::from_millis(disable_ms),
        delete_after: Duration::from_millis(delete_ms),
        recv_timeout: Duration::from_millis(50),
    })
    .expect("bind relay hub")
}

fn transmitter_socket() -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind transmitter socket");
    socket
        .set_read_timeout(Some(Duration::from_secs(2)))
        .unwrap();
    socket
}

fn send_telemetry(socket: &UdpSocket, hub: &RelayHub, packet: &TelemetryPacket) {
    let port = hub.local_addr().unwrap().port();
    socket
        .send_to(&packet.to_bytes(), ("127.0.0.1", port))
        .expect("send telemetry");
}

/// Poll a condition until it holds or two seconds pass.
fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(2);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    false
}

#[test]
fn telemetry_override_roundtrip() {
    let hub = test_hub(2500, 10_000);
    let transmitter = transmitter_socket();

    let telemetry = TelemetryPacket {
        in_throttle: 77,
        in_steer: 60,
        in_button: 0,
        out_throttle: 77,
        out_steer: 60,
        battery_mv: 7900,
    };
    send_telemetry(&transmitter, &hub, &telemetry);

    // First valid packet creates an alive record with id 0
    assert!(wait_for(|| !hub.alive_transmitters().is_empty()));
    assert_eq!(hub.alive_transmitters(), vec![0]);

    let peer_ip = transmitter.local_addr().unwrap().ip();
    assert_eq!(hub.input_throttle(0u64).unwrap(), 77);
    assert_eq!(hub.input_steer(peer_ip).unwrap(), 60);
    assert_eq!(hub.output_steer(0u64).unwrap(), 60);

    // Steer-only override: throttle must be filled from the last *input*
    hub.override_steer(0u64, 40).unwrap();

    // The queue drains on the next valid telemetry packet
    send_telemetry(&transmitter, &hub, &telemetry);

    let mut buf = [0u8; 64];
    let (len, from) = transmitter.recv_from(&mut buf).expect("control packet");
    assert_eq!(from.port(), hub.local_addr().unwrap().port());

    let control = ControlPacket::decode(&buf[..len]).unwrap();
    assert_eq!(control.out_steer, 40);
    assert_eq!(control.out_throttle, 77);

    hub.shutdown();
}

#[test]
fn corrupted_telemetry_creates_no_record() {
    let hub = test_hub(2500, 10_000);
    let transmitter = transmitter_socket();

    let mut bytes = TelemetryPacket::default().to_bytes();
    bytes[0] ^= 0xFF;
    transmitter
        .send_to(&bytes, hub.local_addr().unwrap())
        .unwrap();

    // Also a wrong-sized datagram
    transmitter
        .send_to(&[0u8; 5], hub.local_addr().unwrap())
        .unwrap();

    // A valid packet afterwards still gets id 0: nothing was registered
    send_telemetry(&transmitter, &hub, &TelemetryPacket::default());
    assert!(wait_for(|| !hub.alive_transmitters().is_empty()));
    assert_eq!(hub.alive_transmitters(), vec![0]);

    hub.shutdown();
}

#[test]
fn quiet_transmitter_disappears_from_queries() {
    let hub = test_hub(200, 5000);
    let transmitter = transmitter_socket();

    send_telemetry(&transmitter, &hub, &TelemetryPacket::default());
    assert!(wait_for(|| !hub.alive_transmitters().is_empty()));

    // Stop sending; past the disable threshold every query reports not-found
    assert!(wait_for(|| hub.alive_transmitters().is_empty()));
    assert!(matches!(
        hub.input_throttle(0u64),
        Err(RelayError::PeerNotFound(_))
    ));

    // Telemetry resumes within the delete threshold: same id comes back
    send_telemetry(&transmitter, &hub, &TelemetryPacket::default());
    assert!(wait_for(|| hub.alive_transmitters() == vec![0]));

    hub.shutdown();
}

#[test]
fn override_rejected_while_disabled() {
    let hub = test_hub(150, 5000);
    let transmitter = transmitter_socket();

    send_telemetry(&transmitter, &hub, &TelemetryPacket::default());
    assert!(wait_for(|| !hub.alive_transmitters().is_empty()));
    assert!(wait_for(|| hub.alive_transmitters().is_empty()));

    assert!(matches!(
        hub.override_both(0u64, 10, 20),
        Err(RelayError::PeerNotFound(_))
    ));

    hub.shutdown();
}

#[test]
fn encode_helper_is_wire_compatible() {
    // The same bytes a microcontroller would emit through encode()
    let telemetry = TelemetryPacket {
        in_throttle: 1,
        in_steer: 2,
        in_button: 3,
        out_throttle: 4,
        out_steer: 5,
        battery_mv: 6,
    };
    let mut buf = [0u8; 64];
    let len = telemetry.encode(&mut buf).unwrap();
    assert_eq!(&buf[..len], &telemetry.to_bytes());
}
