/*
 * Copyright (c) 2019 Geoffroy Couprie <contact@geoffroycouprie.com> and Contributors to the Eclipse Foundation.
 * SPDX-License-Identifier: Apache-2.0
 */
#[macro_use]
extern crate bencher;

use bencher::Bencher;
use biscuit::{builder::*, Biscuit, KeyPair};
use rand::{prelude::StdRng, SeedableRng};

fn create_token(b: &mut Bencher) {
    let mut rng: StdRng = SeedableRng::seed_from_u64(1234);
    let root = KeyPair::new(&mut rng);

    b.iter(|| {
        let mut builder = Biscuit::builder(&root);
        builder.add_right("/a/file1.txt", "read");
        builder.add_right("/a/file2.txt", "read");
        let token = builder.build_with_rng(&mut rng).unwrap();
        token.to_vec().unwrap()
    });
}

fn attenuate_token(b: &mut Bencher) {
    let mut rng: StdRng = SeedableRng::seed_from_u64(1234);
    let root = KeyPair::new(&mut rng);

    let mut builder = Biscuit::builder(&root);
    builder.add_right("/a/file1.txt", "read");
    let token = builder.build_with_rng(&mut rng).unwrap().to_vec().unwrap();

    b.iter(|| {
        let biscuit = Biscuit::from(&token).unwrap();
        let mut block_builder = biscuit.create_block();
        block_builder.check_operation("read");

        let keypair = KeyPair::new(&mut rng);
        let attenuated = biscuit.append(&mut rng, &keypair, block_builder).unwrap();
        attenuated.to_vec().unwrap()
    });
}

fn verify_token(b: &mut Bencher) {
    let mut rng: StdRng = SeedableRng::seed_from_u64(1234);
    let root = KeyPair::new(&mut rng);

    let mut builder = Biscuit::builder(&root);
    builder.add_right("/a/file1.txt", "read");
    let biscuit1 = builder.build_with_rng(&mut rng).unwrap();

    let keypair2 = KeyPair::new(&mut rng);
    let mut block_builder = biscuit1.create_block();
    block_builder.check_operation("read");
    let token = biscuit1
        .append(&mut rng, &keypair2, block_builder)
        .unwrap()
        .to_vec()
        .unwrap();

    b.iter(|| {
        let biscuit = Biscuit::from(&token).unwrap();
        let mut verifier = biscuit.verify(root.public()).unwrap();
        verifier.add_resource("/a/file1.txt");
        verifier.add_operation("read");
        verifier
            .add_caveat(rule(
                "right",
                &[string("/a/file1.txt"), s("read")],
                &[pred(
                    "right",
                    &[s("authority"), string("/a/file1.txt"), s("read")],
                )],
            ))
            .unwrap();
        verifier.verify().unwrap()
    });
}

benchmark_group!(benches, create_token, attenuate_token, verify_token);
benchmark_main!(benches);
