/*!

This is the long-form manual for `hierarchy_engine` and the `hierarchy` program.

Every member of a group ranks the other members, from most to least
preferred. From these ballots, the engine derives a single report describing
the informal hierarchy of the group: who leads, how much the members agree,
whether there are clusters, and how robust the structure is.

## Input formats

The following formats are supported by `hierarchy`:
* `json` the native format, also produced by `--out`
* `csv` Comma Separated Values, one ballot per row
* `xlsx` Excel spreadsheets, one ballot per row

When `--input-type` is not given, the type is inferred from the extension of
the input file, falling back to `json`.

### `json`

```text
{
  "participants": [{"id": "p01", "name": "Anna"}, {"id": "p02", "name": "Bob"}],
  "ballots": [{"voterId": "p01", "ranking": ["p02"]}]
}
```

An `analytics` entry, as written by `--out`, is ignored when reading: a saved
analysis can be fed back to the program and the analytics are recomputed.

### `csv` and `xlsx`

Each row is a ballot. The first column is the name of the voter, the
following columns are the names of the ranked members, most preferred first.
Blank cells are skipped.

```text
voter,first,second,third
Anna,Bob,Clara,Dan
Bob,Anna,Dan,Clara
```

The header row is optional: it is recognized when its first cell is `voter`.
Participants are created in the order in which they are first seen, with the
ids `p01`, `p02`, ... Errors report the line of the file.

For Excel files, the worksheet can be chosen with `--excel-worksheet-name`
(default: the first worksheet).

## Metrics

Ranks start at 1 (most preferred). With `n` participants, a complete ballot
ranks `n - 1` people.

Social choice:
- `pairwiseMatrix`: `M[i][j]` is the number of ballots ranking `i` above `j`.
  A ballot that does not rank both participants counts for neither.
  `i` beats `j` when a strict majority of the ballots comparing them prefers `i`.
- `bordaScores`, `bordaRanking`: `n - rank` points per ballot entry.
- `condorcetWinner`: the participant beating every other, if any.
- `condorcetCycles`: the triples `a > b > c > a` of the majority relation.
- `kendallW`: the coefficient of concordance, 1 for unanimity and 0 for no
  agreement at all.

Network (the ranking graph):
- `weightMatrix`: `W[i][j] = n - rank`, the edge weight from voter `i` to `j`.
- `inDegreeCentrality`: incoming weight over the maximum possible.
- `reciprocityIndex`: fraction of top-third links that are mutual.
- `cycleDensity`: fraction of triples forming a majority cycle.
- `kCore`: core number in the undirected top-third graph.
- `betweenness`: Brandes betweenness on the majority graph.
- `communities`, `communityCount`: clusters of members strongly tied by majority preferences.

Inequality and information:
- `giniCoefficient`, `lorenzCurve`: concentration of the Borda scores.
- `stratification`: one of `Linear Hierarchy`, `Tiered Clusters`,
  `Fragmented` or `Mixed Structure`.
- `marginalized`: the bottom Borda scorers that are consistently ranked low.
- `bordaEntropy`, `individualEntropy`: Shannon entropy of the score
  distribution and of the ranks received by each participant.
- `mutualInformation`: agreement between the ballots of two voters, in bits.

Behavior:
- `asymmetryMatrix`: `|rank(i -> j) - rank(j -> i)|`.
- `polarization`: variance of the ranks received.
- `conformity`: Spearman correlation of a ballot with the Borda ranking.
- `reciprocityImbalance`: positive for people giving better ranks than they
  receive.
- `lossAversion`: count of strongly asymmetric relations.
- `eigenvectorCentrality`: power iteration over the pairwise matrix.
- `coalitions`: cliques of mutual top-third preferences.

Perturbation and composites:
- `topNodeRemoval`: change of score of everybody when the top scorer leaves.
- `leadership`: mean z-score of Borda, betweenness and in-degree.
- `subgroupCohesion`: average mutual preference within each community.
- `structuralFragility`: how much of the majority graph falls apart when a
  single participant is removed.

## Program

```text
hierarchy --input group.csv --out analysis.json
hierarchy --input analysis.json --reference analysis.json --verbose
hierarchy --input group.xlsx --history history.jsonl
```

- `--out` (file path or `stdout`, default `stdout`): where to write the
  participants, the ballots and the analytics in JSON.
- `--reference` (file path): a previous output. The program fails and prints
  the differences if the new analysis does not match it.
- `--history` (file path): appends one JSON line per analyzed input, keyed by
  the SHA-256 of its content. The same input is recorded only once.
- `--verbose`: debug logging, unless `RUST_LOG` is set.

 */
