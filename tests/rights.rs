/*
 * Copyright (c) 2019 Geoffroy Couprie <contact@geoffroycouprie.com> and Contributors to the Eclipse Foundation.
 * SPDX-License-Identifier: Apache-2.0
 */
use biscuit::{builder::*, error, Biscuit, KeyPair};
use rand::{prelude::StdRng, SeedableRng};

#[test]
fn rights_scenario() {
    let mut rng: StdRng = SeedableRng::seed_from_u64(1234);
    let root = KeyPair::new(&mut rng);

    let token1 = {
        let mut builder = Biscuit::builder(&root);
        builder.add_right("/a/file1.txt", "read");
        builder.add_right("/a/file1.txt", "write");
        builder.add_right("/a/file2.txt", "read");
        builder.add_right("/b/file3.txt", "write");

        builder.build_with_rng(&mut rng).unwrap().to_vec().unwrap()
    };

    // attenuate the token to read operations on /a/file1.txt
    let token2 = {
        let deser = Biscuit::from(&token1).unwrap();

        let mut block_builder = deser.create_block();
        block_builder.check_resource("/a/file1.txt");
        block_builder.check_operation("read");

        let keypair2 = KeyPair::new(&mut rng);
        deser
            .append(&mut rng, &keypair2, block_builder)
            .unwrap()
            .to_vec()
            .unwrap()
    };

    let biscuit = Biscuit::from(&token2).unwrap();

    let check_rights = |resource: &str, operation: &str| -> Result<(), error::Token> {
        let mut verifier = biscuit.verify(root.public()).unwrap();
        verifier.add_resource(resource);
        verifier.add_operation(operation);
        verifier
            .add_caveat(rule(
                "right",
                &[string(resource), s(operation)],
                &[pred(
                    "right",
                    &[s("authority"), string(resource), s(operation)],
                )],
            ))
            .unwrap();

        verifier.verify()
    };

    // the token restricts to read operations on /a/file1.txt
    assert!(check_rights("/a/file1.txt", "read").is_ok());
    assert!(check_rights("/a/file1.txt", "write").is_err());
    assert!(check_rights("/a/file2.txt", "read").is_err());
}

#[test]
fn authority_fact_prefix_injection() {
    let mut rng: StdRng = SeedableRng::seed_from_u64(1);
    let root = KeyPair::new(&mut rng);

    let mut builder = Biscuit::builder(&root);
    // no leading #authority atom
    builder
        .add_authority_fact(fact("right", &[string("/file1"), s("read")]))
        .unwrap();
    let biscuit = builder.build_with_rng(&mut rng).unwrap();

    let mut verifier = biscuit.verify(root.public()).unwrap();
    verifier.add_resource("/file1");
    verifier.add_operation("read");
    verifier
        .add_caveat(
            "valid($res, $op) <- right(#authority, $res, $op), resource(#ambient, $res), operation(#ambient, $op)",
        )
        .unwrap();

    verifier.verify().unwrap();
}

#[test]
fn duplicate_authority_fact() {
    let mut rng: StdRng = SeedableRng::seed_from_u64(2);
    let root = KeyPair::new(&mut rng);

    let mut builder = Biscuit::builder(&root);
    builder
        .add_authority_fact("right(#authority, \"file1\", #read)")
        .unwrap();

    match builder.add_authority_fact("right(#authority, \"file1\", #read)") {
        Err(error::Token::DuplicateFact(_)) => {}
        other => panic!("unexpected result: {:?}", other),
    }

    // the builder is still usable and the first insertion persists
    builder
        .add_authority_fact("right(#authority, \"file2\", #read)")
        .unwrap();
    let biscuit = builder.build_with_rng(&mut rng).unwrap();

    let mut verifier = biscuit.verify(root.public()).unwrap();
    let facts = verifier
        .query("data($res) <- right(#authority, $res, #read)")
        .unwrap();
    assert_eq!(facts.len(), 2);
}

#[test]
fn attenuation_is_monotone() {
    let mut rng: StdRng = SeedableRng::seed_from_u64(3);
    let root = KeyPair::new(&mut rng);

    let mut builder = Biscuit::builder(&root);
    builder
        .add_authority_caveat("must_have_read(#read) <- operation(#ambient, #read)")
        .unwrap();
    let biscuit1 = builder.build_with_rng(&mut rng).unwrap();

    let keypair2 = KeyPair::new(&mut rng);
    let biscuit2 = biscuit1
        .append(&mut rng, &keypair2, biscuit1.create_block())
        .unwrap();

    let failing = |biscuit: &Biscuit| -> Result<(), error::Token> {
        let mut verifier = biscuit.verify(root.public()).unwrap();
        verifier.add_operation("write");
        verifier.verify()
    };

    // appending a block never makes a failing token pass
    assert!(failing(&biscuit1).is_err());
    assert!(failing(&biscuit2).is_err());
}

#[test]
fn every_flipped_byte_invalidates_the_token() {
    let mut rng: StdRng = SeedableRng::seed_from_u64(4);
    let root = KeyPair::new(&mut rng);

    let mut builder = Biscuit::builder(&root);
    builder.add_right("file1", "read");
    let biscuit1 = builder.build_with_rng(&mut rng).unwrap();

    let keypair2 = KeyPair::new(&mut rng);
    let mut block_builder = biscuit1.create_block();
    block_builder.check_operation("read");
    let biscuit2 = biscuit1.append(&mut rng, &keypair2, block_builder).unwrap();

    let serialized = biscuit2.to_vec().unwrap();

    // a valid copy parses
    assert!(Biscuit::from(&serialized).is_ok());

    for i in 0..serialized.len() {
        let mut tampered = serialized.clone();
        tampered[i] ^= 0x01;

        // depending on the flipped byte this is a framing error or a
        // signature error, but it can never produce a valid token
        assert!(
            Biscuit::from(&tampered).is_err(),
            "byte {} flipped and the token still parsed",
            i
        );
    }
}

#[test]
fn block_caveat_failure_is_located() {
    let mut rng: StdRng = SeedableRng::seed_from_u64(5);
    let root = KeyPair::new(&mut rng);

    let mut builder = Biscuit::builder(&root);
    builder.add_right("file1", "read");
    let biscuit1 = builder.build_with_rng(&mut rng).unwrap();

    let keypair2 = KeyPair::new(&mut rng);
    let mut block_builder = biscuit1.create_block();
    block_builder.check_resource("file123");
    let biscuit2 = biscuit1.append(&mut rng, &keypair2, block_builder).unwrap();

    let mut verifier = biscuit2.verify(root.public()).unwrap();
    verifier.add_resource("file456");

    match verifier.verify() {
        Err(error::Token::FailedLogic(error::Logic::FailedCaveats(failed))) => {
            assert_eq!(failed.len(), 1);
            match &failed[0] {
                error::FailedCaveat::Block(block) => {
                    assert_eq!(block.block_id, 1);
                    assert_eq!(block.caveat_id, 0);
                }
                other => panic!("unexpected failure: {:?}", other),
            }
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn unknown_root_key_is_refused() {
    let mut rng: StdRng = SeedableRng::seed_from_u64(6);
    let root = KeyPair::new(&mut rng);

    let mut builder = Biscuit::builder(&root);
    builder.add_right("file1", "read");
    let biscuit = builder.build_with_rng(&mut rng).unwrap();

    let other = KeyPair::new(&mut rng);
    match biscuit.verify(other.public()) {
        Err(error::Token::Format(error::Format::UnknownPublicKey)) => {}
        other => panic!(
            "unexpected result: {:?}",
            other.map(|_| "verifier created")
        ),
    }
}

#[test]
fn parsed_rules_and_caveats() {
    let mut rng: StdRng = SeedableRng::seed_from_u64(7);
    let root = KeyPair::new(&mut rng);

    let mut builder = Biscuit::builder(&root);
    builder
        .add_authority_fact("role(#authority, \"admin\", \"file1\")")
        .unwrap();
    builder
        .add_authority_rule(
            "right($res, #read) <- role(#authority, \"admin\", $res)",
        )
        .unwrap();
    let biscuit = builder.build_with_rng(&mut rng).unwrap();

    let mut verifier = biscuit.verify(root.public()).unwrap();
    verifier.add_resource("file1");
    verifier
        .add_caveat("valid($res) <- right(#authority, $res, #read), resource(#ambient, $res)")
        .unwrap();

    verifier.verify().unwrap();
}
