use gzqr_crypto::{decrypt, encrypt, sha256_hex, ArchiveKey};

fn make_data(size: usize) -> Vec<u8> {
    (0..size)
        .map(|i| (i.wrapping_mul(7) ^ (i >> 3)) as u8)
        .collect()
}

const NONCE: [u8; 12] = [0x5Au8; 12];

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_encrypt(bencher: divan::Bencher, size: usize) {
    let key = ArchiveKey::from_bytes([0xABu8; 32]);
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            encrypt(
                divan::black_box(&data),
                divan::black_box(&key),
                &NONCE,
                b"bench",
            )
            .unwrap()
        });
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_decrypt(bencher: divan::Bencher, size: usize) {
    let key = ArchiveKey::from_bytes([0xABu8; 32]);
    let ciphertext = encrypt(&make_data(size), &key, &NONCE, b"bench").unwrap();
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| {
            decrypt(
                divan::black_box(&ciphertext),
                divan::black_box(&key),
                &NONCE,
                b"bench",
            )
            .unwrap()
        });
}

#[divan::bench(args = [1024, 65536, 1048576])]
fn bench_sha256_hex(bencher: divan::Bencher, size: usize) {
    let data = make_data(size);
    bencher
        .counter(divan::counter::BytesCount::new(size))
        .bench(|| sha256_hex(divan::black_box(&data)));
}

fn main() {
    divan::main();
}
