/*
 * Copyright (c) 2019 Geoffroy Couprie <contact@geoffroycouprie.com> and Contributors to the Eclipse Foundation.
 * SPDX-License-Identifier: Apache-2.0
 */
//! Biscuit authentication and authorization token
//!
//! Biscuit is an authorization token for microservices architectures with the following properties:
//!
//! * decentralized validation: any node could validate the token only with public information;
//! * offline delegation: a new, valid token can be created from another one by attenuating its rights, by its holder, without communicating with anyone;
//! * capabilities based: authorization in microservices should be tied to rights related to the request, instead of relying to an identity that might not make sense to the verifier;
//! * flexible rights managements: the token uses a logic language to specify attenuation and add bounds on ambient data;
//! * small enough to fit anywhere (cookies, etc).
//!
//! Non goals:
//!
//! * This is not a new authentication protocol. Biscuit tokens can be used as opaque tokens delivered by other systems such as OAuth.
//! * Revocation: while tokens come with expiration dates, revocation requires external state management.
//!
//! # Usage
//!
//! Most of the interaction with this library is done through the
//! [Biscuit](`crate::Biscuit`) structure, that represents a valid
//! token, and the [Verifier](`crate::Verifier`), used to
//! check authorization policies on a token.
//!
//! In this example we will see how we can create a token, add some caveats,
//! serialize and deserialize a token, append more caveats, and validate
//! those caveats in the context of a request:
//!
//! ```rust
//! use biscuit::{builder::*, Biscuit, KeyPair};
//! use rand::prelude::StdRng;
//! use rand_core::SeedableRng;
//!
//! fn main() -> Result<(), biscuit::error::Token> {
//!   // let's generate the root key pair. The root public key will be necessary
//!   // to verify the token
//!   let mut rng: StdRng = SeedableRng::seed_from_u64(1234);
//!   let root = KeyPair::new(&mut rng);
//!   let public_key = root.public();
//!
//!   // creating a first token
//!   let token1 = {
//!     // the first block of the token is the authority block. It contains global
//!     // information like which operation types are available
//!     let mut builder = Biscuit::builder(&root);
//!
//!     // facts can be parsed from a string, or built with the helper functions
//!     builder.add_authority_fact("right(#authority, \"/a/file1.txt\", #read)")?;
//!     builder.add_authority_fact(fact(
//!         "right",
//!         &[string("/a/file1.txt"), s("write")],
//!     ))?;
//!     builder.add_authority_fact("right(#authority, \"/a/file2.txt\", #read)")?;
//!
//!     // the first block is signed
//!     let biscuit = builder.build_with_rng(&mut rng)?;
//!
//!     println!("biscuit (authority): {}", biscuit);
//!
//!     biscuit.to_vec()?
//!   };
//!
//!   // now let's add some restrictions to this token
//!   // we want to limit access to `/a/file1.txt` and to read operations
//!   let token2 = {
//!     // the token is deserialized, the signature is verified
//!     let deser = Biscuit::from(&token1)?;
//!
//!     // biscuits can be attenuated by appending caveats
//!     let mut block_builder = deser.create_block();
//!
//!     // caveats are implemented as logic rules. If the rule produces something,
//!     // the caveat is successful
//!     block_builder.check_resource("/a/file1.txt");
//!     block_builder.check_operation("read");
//!
//!     // the new block is signed under its own key pair; the private key can
//!     // be discarded right after this call
//!     let keypair2 = KeyPair::new(&mut rng);
//!     let biscuit = deser.append(&mut rng, &keypair2, block_builder)?;
//!
//!     biscuit.to_vec()?
//!   };
//!
//!   /************** VERIFICATION ****************/
//!
//!   // let's deserialize the token:
//!   let biscuit = Biscuit::from(&token2)?;
//!
//!   // the verifier provides ambient data describing the request, along with
//!   // its own caveats. The token restricts to read operations on
//!   // `/a/file1.txt`, so this request passes:
//!   let mut verifier = biscuit.verify(public_key)?;
//!   verifier.add_resource("/a/file1.txt");
//!   verifier.add_operation("read");
//!   verifier.add_caveat(rule(
//!       "right",
//!       &[var("right")],
//!       &[pred(
//!           "right",
//!           &[s("authority"), string("/a/file1.txt"), var("right")],
//!       )],
//!   ))?;
//!
//!   verifier.verify()?;
//!
//!   // a write operation is refused by the token's caveats
//!   let mut verifier = biscuit.verify(public_key)?;
//!   verifier.add_resource("/a/file1.txt");
//!   verifier.add_operation("write");
//!   assert!(verifier.verify().is_err());
//!
//!   Ok(())
//! }
//! ```
//!
//! # Concepts
//!
//! ## Blocks
//!
//! A Biscuit token is made with a list of blocks defining data and caveats
//! that must be validated upon reception with a request. Any failed caveat
//! will invalidate the entire token.
//!
//! If you hold a valid token, it is possible to add a new block to restrict
//! further the token, like limiting access to one particular resource, or
//! adding a short expiration date. This will generate a new, valid token.
//! This can be done offline, without asking the original token creator.
//!
//! On the other hand, if a block is modified or removed, the token will fail
//! the cryptographic signature verification.
//!
//! ## Cryptography
//!
//! Biscuit tokens get inspiration from macaroons and JSON Web Tokens,
//! reproducing useful features from both:
//!
//! - offline delegation like macaroons
//! - based on public key cryptography like JWT, so any application holding
//! the root public key can verify a token (while macaroons are based on a
//! root shared secret)
//!
//! Each block is signed by its own key pair, and the per block signatures
//! aggregate into a single pair of values covering the serialized bytes of
//! every block, so a block cannot be modified, removed or reordered without
//! invalidating the aggregate.
//!
//! ## A logic language for caveats: Datalog with constraints
//!
//! We rely on a modified version of Datalog, that can represent complex
//! behaviours in a compact form, and add flexible constraints on data.
//!
//! Here are examples of caveats that can be implemented with that language:
//!
//! - valid if the requested resource is "file.txt" and the operation is "read"
//! - valid if current time is before January 1st 2030, 00h00mn00s UTC
//! - the resource matches the prefix "/home/biscuit/data/"
//!
//! A fact carrying the `#authority` symbol in first position can only come
//! from the authority block, and a fact carrying `#ambient` only from the
//! verifier. This allows Biscuit to carry basic rights in the first block
//! while preventing later blocks from increasing the token's rights.
//!
//! A caveat is a set of queries; it is validated if at least one of them
//! produces a fact. The verifier evaluates every caveat from every block,
//! which is why appending a block can only restrict the token further.
//!
//! ## Symbol table
//!
//! To reduce the size of tokens, the language uses string interning: strings
//! are serialized as an index in a list of strings. Any repetition of the
//! string will then use reduced space.
//!
//! The authority block defines its symbols on top of a default table common
//! to all implementations, and every following block appends its own delta,
//! so an index keeps pointing to the same string across the whole token.

pub mod crypto;
pub mod datalog;
pub mod error;
pub mod format;
pub mod parser;
mod token;

pub use crypto::{KeyPair, PrivateKey, PublicKey, TokenSignature};
pub use token::builder;
pub use token::verifier::Verifier;
pub use token::{default_symbol_table, Biscuit, Block};
