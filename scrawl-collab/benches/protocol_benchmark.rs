use criterion::{black_box, criterion_group, criterion_main, Criterion};
use scrawl_collab::Message;
use scrawl_core::{codec, Rgb, Shape, WireFormat};

fn sample_star() -> Shape {
    Shape::star(100, 100, 80, 80, Rgb::new(255, 0, 0), 6)
}

fn bench_shape_encode_binary(c: &mut Criterion) {
    let star = sample_star();
    c.bench_function("shape_encode_binary", |b| {
        b.iter(|| black_box(codec::encode(black_box(&star), WireFormat::Binary).unwrap()))
    });
}

fn bench_shape_encode_json(c: &mut Criterion) {
    let star = sample_star();
    c.bench_function("shape_encode_json", |b| {
        b.iter(|| black_box(codec::encode(black_box(&star), WireFormat::Json).unwrap()))
    });
}

fn bench_shape_decode_binary(c: &mut Criterion) {
    let bytes = codec::encode(&sample_star(), WireFormat::Binary).unwrap();
    c.bench_function("shape_decode_binary", |b| {
        b.iter(|| black_box(codec::decode("Star", black_box(&bytes), WireFormat::Binary).unwrap()))
    });
}

fn bench_message_encode(c: &mut Criterion) {
    let payload = codec::encode(&sample_star(), WireFormat::Binary).unwrap();
    c.bench_function("message_encode_response_object", |b| {
        b.iter(|| {
            let msg = Message::ResponseObject {
                tag: "Star".to_string(),
                payload: black_box(payload.clone()),
            };
            black_box(msg.encode().unwrap());
        })
    });
}

fn bench_message_decode(c: &mut Criterion) {
    let payload = codec::encode(&sample_star(), WireFormat::Binary).unwrap();
    let frame = Message::ResponseObject { tag: "Star".to_string(), payload }
        .encode()
        .unwrap();
    c.bench_function("message_decode_response_object", |b| {
        b.iter(|| black_box(Message::decode(black_box(&frame)).unwrap()))
    });
}

fn bench_message_roundtrip(c: &mut Criterion) {
    let star = sample_star();
    c.bench_function("message_roundtrip_response_object", |b| {
        b.iter(|| {
            let payload = codec::encode(&star, WireFormat::Binary).unwrap();
            let msg = Message::ResponseObject { tag: star.type_tag().to_string(), payload };
            let frame = msg.encode().unwrap();
            black_box(Message::decode(&frame).unwrap());
        })
    });
}

criterion_group!(
    benches,
    bench_shape_encode_binary,
    bench_shape_encode_json,
    bench_shape_decode_binary,
    bench_message_encode,
    bench_message_decode,
    bench_message_roundtrip,
);
criterion_main!(benches);
