/*!

This is the long-form manual for `survey_stats` and `surveytally`.

## Collecting answers

Each question of the catalog asks a voter two things:
* how confident they are: `none`, `medium` or `full`
* an estimate in months, as a non-negative whole number

A submission that does not follow these rules (for example `strong` as a confidence,
or `-3` / `3.5` / `ten` as months) is dropped. It is not recorded, and the voter simply
moves on to the next question. `surveytally` logs every dropped submission at the
`warn` level.

```bash
surveytally vote -q 0 -c full -m 10
surveytally walk
```

`walk` goes through all the questions in order, reading the confidence then the months
for each question from the standard input. After the last question it prints the results,
in the same form as `surveytally results`.

## The state file

All the answers are kept in one JSON file (by default `voting_state.json`, see `--state`).
It is rewritten after every recorded answer. The keys are the question ids, and for each
question the two lists are aligned: the i-th confidence and the i-th months belong to
the same voter.

```json
{
  "0": {"confidence": ["full", "none"], "months": [10, 20]},
  "1": {"confidence": ["medium"], "months": [5]}
}
```

Questions missing from the file start empty. This lets a survey grow new questions
without touching the file. On the other hand, a file that cannot be read back exactly
(invalid JSON, unknown confidence labels, lists of different lengths, ids beyond the
catalog) stops the program instead of starting from an empty survey.

## Results

```bash
surveytally results --out summary.json
```

For each question:
* `medianMonths`: the median of the months (average of the two middle values for an even count)
* `medianConfidence`: the median of the confidence scores, with none=0, medium=1, full=2
* `divergenceMonths`: the largest minus the smallest months
* `sampleCount`: the number of answers

A question without answers reports 0 everywhere.

The survey-wide `totalMedianMonths` is the sum of the medians of all the questions.
`participantCount` is the number of answers to the first question. It is only an
approximation of the number of voters.

`surveytally export --out voters.csv` writes one row per answer, for drawing per-voter charts.

*/
