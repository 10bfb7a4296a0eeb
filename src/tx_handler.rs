use crate::{
    Ed25519Verifier, SignatureVerifier, Transaction, TransactionId, TransactionValidator, Utxo,
    UtxoPool,
};
use std::collections::HashSet;

/// Maintains the public ledger between epochs.
/// Each epoch, the handler receives an unordered batch of proposed transactions, accepts a
/// mutually valid subset of them and applies it to its own UTXO pool.
pub struct TxHandler<V = Ed25519Verifier> {
    // A private copy, the snapshot the handler was created from is never modified.
    utxo_pool: UtxoPool,
    validator: TransactionValidator<V>,
}

impl TxHandler<Ed25519Verifier> {
    pub fn new(utxo_pool: &UtxoPool) -> Self {
        Self::with_verifier(utxo_pool, Ed25519Verifier)
    }
}

impl<V: SignatureVerifier> TxHandler<V> {
    pub fn with_verifier(utxo_pool: &UtxoPool, verifier: V) -> Self {
        Self {
            utxo_pool: utxo_pool.clone(),
            validator: TransactionValidator::new(verifier),
        }
    }

    pub fn utxo_pool(&self) -> &UtxoPool {
        &self.utxo_pool
    }

    pub fn into_utxo_pool(self) -> UtxoPool {
        self.utxo_pool
    }

    /// Checks the transaction against the current state of the handler's pool.
    pub fn is_valid_tx(&self, transaction: &Transaction) -> bool {
        self.validator.is_valid(transaction, &self.utxo_pool)
    }

    /// Handles an epoch: returns the accepted transactions in the order they were accepted and
    /// updates the pool accordingly.
    ///
    /// A transaction may spend outputs created by another transaction of the same batch, so
    /// the batch is scanned repeatedly until a full pass accepts nothing. Transactions competing
    /// for the same output are mutually exclusive: the first one accepted wins, and which one
    /// that is depends on the processing order. Callers must not rely on it.
    /// Transactions that never become valid are dropped.
    pub fn handle_txs(&mut self, possible_transactions: Vec<Transaction>) -> Vec<Transaction> {
        let mut pending = Self::deduplicate(possible_transactions);
        let mut accepted = vec![];
        let mut pass = 0;
        loop {
            pass += 1;
            let mut accepted_in_pass = HashSet::new();
            for transaction in &pending {
                match self.validator.validate(transaction, &self.utxo_pool) {
                    Ok(()) => {
                        self.apply(transaction);
                        accepted_in_pass.insert(*transaction.id());
                        accepted.push(transaction.clone());
                        tracing::debug!(
                            "Accepted transaction: {} in pass: {}",
                            transaction.id(),
                            pass
                        );
                    }
                    Err(reason) => {
                        tracing::trace!(
                            "Transaction: {} is not valid in pass: {}. Reason: {}",
                            transaction.id(),
                            pass,
                            reason
                        );
                    }
                }
            }
            if accepted_in_pass.is_empty() {
                break;
            }
            pending.retain(|transaction| !accepted_in_pass.contains(transaction.id()));
        }

        for transaction in &pending {
            tracing::debug!("Rejected transaction: {}", transaction.id());
        }
        tracing::info!(
            "Epoch handled in {} passes. Accepted: {}, rejected: {}, unspent outputs: {}",
            pass,
            accepted.len(),
            pending.len(),
            self.utxo_pool.len()
        );
        accepted
    }

    /// Spends the inputs of a valid transaction and adds its outputs to the pool.
    fn apply(&mut self, transaction: &Transaction) {
        for input in transaction.inputs() {
            let spent = self.utxo_pool.remove(&Utxo::from(input));
            // The transaction was validated against the current pool, and it doesn't spend
            // any output twice.
            assert!(spent.is_some(), "Spent output: {} is not in the pool", input);
        }
        self.utxo_pool.add_outputs(transaction);
    }

    // Keeps the first occurrence of each transaction, in the order of the batch.
    fn deduplicate(transactions: Vec<Transaction>) -> Vec<Transaction> {
        let mut seen: HashSet<TransactionId> = HashSet::new();
        transactions
            .into_iter()
            .filter(|transaction| seen.insert(*transaction.id()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{KeyPair, OutputIndex, PublicKey, TransactionBuilder};
    use proptest::prelude::*;

    fn key(seed: u8) -> KeyPair {
        KeyPair::from_seed([seed; 32])
    }

    fn pay(from: &KeyPair, utxos: &[Utxo], outputs: &[(PublicKey, i64)]) -> Transaction {
        let mut builder = TransactionBuilder::new();
        for utxo in utxos {
            builder.add_input(*utxo.utxo_id(), *utxo.output_index());
        }
        for (recipient, amount) in outputs {
            builder.add_output(*recipient, *amount);
        }
        for i in 0..utxos.len() {
            builder.sign_input(i, from).unwrap();
        }
        builder.build()
    }

    fn output_of(transaction: &Transaction, index: u32) -> Utxo {
        Utxo::new(*transaction.id(), OutputIndex::new(index))
    }

    #[test]
    fn handler_copies_the_snapshot() {
        let alice = key(1);
        let bob = key(2);
        let (snapshot, genesis) = UtxoPool::with_allocations(&[(alice.public_key(), 10)]);
        let mut handler = TxHandler::new(&snapshot);

        let t1 = pay(&alice, &[output_of(&genesis, 0)], &[(bob.public_key(), 10)]);
        assert_eq!(handler.handle_txs(vec![t1]).len(), 1);

        assert!(snapshot.contains(&output_of(&genesis, 0)));
        assert!(!handler.utxo_pool().contains(&output_of(&genesis, 0)));
    }

    #[test]
    fn empty_pool_rejects_everything() {
        let alice = key(1);
        let (_, genesis) = UtxoPool::with_allocations(&[(alice.public_key(), 10)]);
        let mut handler = TxHandler::new(&UtxoPool::new());
        let t1 = pay(&alice, &[output_of(&genesis, 0)], &[(alice.public_key(), 10)]);
        assert!(!handler.is_valid_tx(&t1));
        assert!(handler.handle_txs(vec![t1]).is_empty());
        assert!(handler.utxo_pool().is_empty());
    }

    #[test]
    fn chained_transactions_submitted_out_of_order() {
        let a = key(1);
        let b = key(2);
        let c = key(3);
        let (pool, genesis) = UtxoPool::with_allocations(&[(a.public_key(), 10)]);
        let t1 = pay(&a, &[output_of(&genesis, 0)], &[(b.public_key(), 10)]);
        let t2 = pay(&b, &[output_of(&t1, 0)], &[(c.public_key(), 10)]);

        let mut handler = TxHandler::new(&pool);
        assert!(!handler.is_valid_tx(&t2));
        let accepted = handler.handle_txs(vec![t2.clone(), t1.clone()]);

        assert_eq!(accepted, vec![t1.clone(), t2.clone()]);
        let pool = handler.utxo_pool();
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(&output_of(&t2, 0)));
        assert_eq!(pool.balance(&c.public_key()), 10);
    }

    #[test]
    fn long_chain_in_reverse_order() {
        let keys = (1..=6).map(key).collect::<Vec<KeyPair>>();
        let (pool, genesis) = UtxoPool::with_allocations(&[(keys[0].public_key(), 100)]);
        let mut chain = vec![];
        let mut spent = output_of(&genesis, 0);
        for window in keys.windows(2) {
            let transaction = pay(&window[0], &[spent], &[(window[1].public_key(), 100)]);
            spent = output_of(&transaction, 0);
            chain.push(transaction);
        }

        let mut handler = TxHandler::new(&pool);
        let mut batch = chain.clone();
        batch.reverse();
        let accepted = handler.handle_txs(batch);

        assert_eq!(accepted, chain);
        assert_eq!(handler.utxo_pool().balance(&keys[5].public_key()), 100);
    }

    #[test]
    fn conflicting_transactions_exactly_one_accepted() {
        let alice = key(1);
        let bob = key(2);
        let carol = key(3);
        let (pool, genesis) = UtxoPool::with_allocations(&[(alice.public_key(), 10)]);
        let utxo = output_of(&genesis, 0);
        let to_bob = pay(&alice, &[utxo], &[(bob.public_key(), 10)]);
        let to_carol = pay(&alice, &[utxo], &[(carol.public_key(), 10)]);

        let mut handler = TxHandler::new(&pool);
        assert!(handler.is_valid_tx(&to_bob));
        assert!(handler.is_valid_tx(&to_carol));
        let accepted = handler.handle_txs(vec![to_bob.clone(), to_carol.clone()]);

        assert_eq!(accepted.len(), 1);
        let winner = &accepted[0];
        assert!(*winner == to_bob || *winner == to_carol);
        let pool = handler.utxo_pool();
        assert!(!pool.contains(&utxo));
        assert_eq!(pool.len(), 1);
        assert!(pool.contains(&output_of(winner, 0)));
        assert_eq!(
            pool.balance(&bob.public_key()) + pool.balance(&carol.public_key()),
            10
        );
    }

    #[test]
    fn duplicate_transactions_are_handled_once() {
        let alice = key(1);
        let bob = key(2);
        let (pool, genesis) = UtxoPool::with_allocations(&[(alice.public_key(), 10)]);
        let t1 = pay(&alice, &[output_of(&genesis, 0)], &[(bob.public_key(), 10)]);

        let mut handler = TxHandler::new(&pool);
        let accepted = handler.handle_txs(vec![t1.clone(), t1.clone(), t1.clone()]);
        assert_eq!(accepted, vec![t1.clone()]);
        assert_eq!(handler.utxo_pool().len(), 1);
    }

    #[test]
    fn invalid_transactions_leave_pool_untouched() {
        let alice = key(1);
        let bob = key(2);
        let (pool, genesis) = UtxoPool::with_allocations(&[(alice.public_key(), 10)]);
        let utxo = output_of(&genesis, 0);
        let overspend = pay(&alice, &[utxo], &[(bob.public_key(), 11)]);
        let forged = pay(&bob, &[utxo], &[(bob.public_key(), 10)]);
        let negative = pay(&alice, &[utxo], &[(bob.public_key(), 12), (alice.public_key(), -2)]);

        let mut handler = TxHandler::new(&pool);
        assert!(handler.handle_txs(vec![overspend, forged, negative]).is_empty());
        assert_eq!(handler.utxo_pool(), &pool);
    }

    #[test]
    fn pool_reflects_accepted_transactions() {
        let alice = key(1);
        let bob = key(2);
        let carol = key(3);
        let (pool, genesis) = UtxoPool::with_allocations(&[
            (alice.public_key(), 10),
            (alice.public_key(), 20),
            (bob.public_key(), 5),
        ]);
        let t1 = pay(
            &alice,
            &[output_of(&genesis, 0), output_of(&genesis, 1)],
            &[(bob.public_key(), 25), (alice.public_key(), 4)],
        );
        let t2 = pay(
            &bob,
            &[output_of(&genesis, 2), output_of(&t1, 0)],
            &[(carol.public_key(), 30)],
        );
        let rejected = pay(&carol, &[output_of(&genesis, 2)], &[(carol.public_key(), 5)]);

        let mut handler = TxHandler::new(&pool);
        let accepted = handler.handle_txs(vec![rejected, t2.clone(), t1.clone()]);
        assert_eq!(accepted, vec![t1.clone(), t2.clone()]);

        let pool = handler.into_utxo_pool();
        for transaction in &accepted {
            for input in transaction.inputs() {
                assert!(!pool.contains(&Utxo::from(input)));
            }
        }
        assert!(pool.contains(&output_of(&t1, 1)));
        assert!(!pool.contains(&output_of(&t1, 0)));
        assert!(pool.contains(&output_of(&t2, 0)));
        assert_eq!(pool.len(), 2);
        // One coin went to fees.
        assert_eq!(pool.total_amount(), 34);
    }

    #[test]
    fn next_epoch_sees_previous_epoch() {
        let alice = key(1);
        let bob = key(2);
        let (pool, genesis) = UtxoPool::with_allocations(&[(alice.public_key(), 10)]);
        let t1 = pay(&alice, &[output_of(&genesis, 0)], &[(bob.public_key(), 10)]);
        let t2 = pay(&bob, &[output_of(&t1, 0)], &[(alice.public_key(), 10)]);

        let mut handler = TxHandler::new(&pool);
        assert_eq!(handler.handle_txs(vec![t1.clone()]), vec![t1.clone()]);
        // Replaying an already committed transaction fails, its input is gone.
        assert!(handler.handle_txs(vec![t1]).is_empty());
        assert_eq!(handler.handle_txs(vec![t2.clone()]), vec![t2]);
        assert_eq!(handler.utxo_pool().balance(&alice.public_key()), 10);
    }

    // Each spend is described by the indices of genesis outputs or outputs of earlier spends.
    fn random_batch() -> impl Strategy<Value = (Vec<i64>, Vec<(Vec<usize>, Vec<i64>)>)> {
        (
            prop::collection::vec(0i64..100, 1..6),
            prop::collection::vec(
                (
                    prop::collection::vec(0usize..12, 1..3),
                    prop::collection::vec(-5i64..100, 1..3),
                ),
                1..10,
            ),
        )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn committed_batch_is_consistent((allocations, spends) in random_batch()) {
            let owner = key(9);
            let allocations = allocations
                .into_iter()
                .map(|amount| (owner.public_key(), amount))
                .collect::<Vec<_>>();
            let (pool, genesis) = UtxoPool::with_allocations(&allocations);

            // Every output created in the batch is also owned by `owner`, so any transaction
            // may spend any output, including outputs of other transactions in the batch.
            let mut known_outputs = (0..allocations.len())
                .map(|i| output_of(&genesis, i as u32))
                .collect::<Vec<Utxo>>();
            let mut batch = vec![];
            for (inputs, amounts) in spends {
                let utxos = inputs
                    .iter()
                    .map(|i| known_outputs[i % known_outputs.len()])
                    .collect::<Vec<Utxo>>();
                let outputs = amounts
                    .iter()
                    .map(|amount| (owner.public_key(), *amount))
                    .collect::<Vec<_>>();
                let transaction = pay(&owner, &utxos, &outputs);
                for i in 0..outputs.len() {
                    known_outputs.push(output_of(&transaction, i as u32));
                }
                batch.push(transaction);
            }
            batch.reverse();

            let mut handler = TxHandler::new(&pool);
            let accepted = handler.handle_txs(batch);
            let final_pool = handler.utxo_pool();

            let mut spent = HashSet::new();
            for transaction in &accepted {
                for input in transaction.inputs() {
                    let utxo = Utxo::from(input);
                    // No output is spent twice across the committed set.
                    prop_assert!(spent.insert(utxo));
                    prop_assert!(!final_pool.contains(&utxo));
                }
            }
            for transaction in &accepted {
                for i in 0..transaction.outputs().len() {
                    let utxo = output_of(transaction, i as u32);
                    prop_assert_eq!(final_pool.contains(&utxo), !spent.contains(&utxo));
                }
            }
            // Value is never created.
            prop_assert!(final_pool.total_amount() <= pool.total_amount());
            // Committed transactions can't be replayed against the final pool.
            for transaction in &accepted {
                prop_assert!(!handler.is_valid_tx(transaction));
            }
        }
    }
}
