use sparse_allreduce_sim::{
    CostModel, Result, SimConfig, SimErr, Simulator, Validation, aggregator::Phase,
};

#[test]
fn single_worker_two_nonzero_blocks() -> Result<()> {
    let mut sim = Simulator::new(1, 4, 1)?;
    sim.load_data(vec![vec![1., 0., 0., 0., 2., 0., 0., 0.]])?;
    sim.run()?;

    let cost = CostModel::default();
    let (bs, bf) = (4, 1);
    let wire = cost.transmit(1, bs, bf);
    let absorb = cost.process(1, bs, bf);
    let select = cost.select(1, bf);

    // first round scans the single element of block 1 to find its nonzero
    let first = cost.prepare(1, 1, bs, bf) + wire + absorb + select + wire + absorb;
    let second = cost.prepare(1, 0, bs, bf) + wire + absorb + select + wire + absorb;

    assert_eq!(sim.get_time(), first + second);
    assert_eq!(sim.stats().rounds, 2);
    assert_eq!(sim.stats().compute_time + sim.stats().network_time, first + second);
    assert_eq!(sim.workers()[0].gradients(), &[1., 0., 0., 0., 2., 0., 0., 0.]);
    assert!(sim.workers()[0].is_exhausted());
    assert!(sim.aggregator().is_done());
    assert_eq!(sim.aggregator().phase(), Phase::Collecting);

    Ok(())
}

#[test]
fn complementary_gradients_are_merged() -> Result<()> {
    let mut sim = Simulator::new(2, 2, 1)?;
    sim.load_data(vec![vec![1., 0.], vec![0., 1.]])?;
    sim.run()?;

    for worker in sim.workers() {
        assert_eq!(worker.gradients(), &[1., 1.]);
    }
    assert_eq!(sim.stats().rounds, 1);
    assert_eq!(sim.stats().worker_packets, 2);

    Ok(())
}

#[test]
fn disjoint_blocks_take_one_round_each() -> Result<()> {
    // worker 0 only holds block 1, worker 1 only holds block 2
    let mut sim = Simulator::new(2, 1, 1)?;
    sim.load_data(vec![vec![0., 5., 0., 0.], vec![0., 0., 7., 0.]])?;
    sim.run()?;

    for worker in sim.workers() {
        assert_eq!(worker.gradients(), &[0., 5., 7., 0.]);
    }
    assert_eq!(sim.stats().rounds, 3);
    assert_eq!(sim.stats().blocks_broadcast, 3);
    // both heads, then one sender per round
    assert_eq!(sim.stats().worker_packets, 4);

    Ok(())
}

#[test]
fn all_zero_gradients_finish_after_the_heads() -> Result<()> {
    let mut sim = Simulator::new(3, 4, 2)?;
    sim.load_data(vec![vec![0.; 32]; 3])?;
    sim.run()?;

    assert_eq!(sim.stats().rounds, 1);
    assert_eq!(sim.stats().blocks_broadcast, 2);
    for worker in sim.workers() {
        assert!(worker.gradients().iter().all(|&x| x == 0.));
        assert!(worker.is_exhausted());
    }

    Ok(())
}

#[test]
fn more_columns_than_blocks() -> Result<()> {
    let mut sim = Simulator::new(2, 2, 5)?;
    sim.load_data(vec![vec![1., 2., 0., 0., 3., 0.], vec![0., 0., 0., 1., 0., 0.]])?;
    sim.run()?;

    for worker in sim.workers() {
        assert_eq!(worker.gradients(), &[1., 2., 0., 1., 3., 0.]);
    }
    assert_eq!(sim.stats().rounds, 1);
    assert_eq!(sim.stats().blocks_broadcast, 3);

    Ok(())
}

#[test]
fn dense_data_visits_every_block() -> Result<()> {
    let (num_workers, bs, bf, size) = (3, 4, 2, 64);

    let config = SimConfig::new(num_workers, bs, bf)?.with_seed(7);
    let mut sim = Simulator::with_config(config);
    sim.generate_data(size, 0.)?;
    sim.run()?;

    let num_blocks = (size / bs) as u64;
    assert_eq!(sim.stats().rounds, num_blocks / bf as u64);
    assert_eq!(sim.stats().blocks_broadcast, num_blocks);
    assert_eq!(sim.stats().blocks_sent, num_blocks * num_workers as u64);

    Ok(())
}

#[test]
fn free_cost_model_still_terminates() -> Result<()> {
    let free = CostModel {
        copy_per_element: 0,
        scan_per_element: 0,
        network_per_element: 0,
        network_latency: 0,
        column_overhead: 0,
    };

    let config = SimConfig::new(4, 8, 3)?.with_cost(free).with_seed(11);
    let mut sim = Simulator::with_config(config);
    sim.generate_data(8 * 30, 0.9)?;
    sim.run()?;

    assert_eq!(sim.get_time(), 0);
    assert!(sim.stats().rounds >= 1);
    assert!(sim.aggregator().is_done());

    Ok(())
}

#[test]
fn fast_and_strict_agree() -> Result<()> {
    let run = |validation| -> Result<(u64, Vec<Vec<f32>>)> {
        let config = SimConfig::new(4, 16, 4)?
            .with_validation(validation)
            .with_seed(42);
        let mut sim = Simulator::with_config(config);
        sim.generate_data(16 * 64, 0.95)?;
        sim.run()?;

        let grads = sim
            .workers()
            .iter()
            .map(|worker| worker.gradients().to_vec())
            .collect();
        Ok((sim.get_time(), grads))
    };

    assert_eq!(run(Validation::Strict)?, run(Validation::Fast)?);
    Ok(())
}

#[test]
fn configuration_errors_are_reported() {
    assert_eq!(
        Simulator::new(2, 4, 0).err(),
        Some(SimErr::ZeroParameter { name: "bf_width" })
    );

    let mut sim = Simulator::new(2, 4, 1).unwrap();
    assert_eq!(sim.generate_data(0, 0.5), Err(SimErr::EmptyData));
    assert_eq!(
        sim.generate_data(8, -0.1),
        Err(SimErr::InvalidSparsity(-0.1))
    );
    assert_eq!(sim.run(), Err(SimErr::DataNotGenerated));
}
